use crate::client::ClientError;
use crate::model::AddLinkData;
use crate::views::detail_path;

/// What the page does once a link submission settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Redirect(String),
    /// Show the message and stay on the page.
    Alert(String),
}

impl Navigation {
    pub fn from_outcome(outcome: Result<AddLinkData, ClientError>) -> Self {
        match outcome {
            Ok(data) => Navigation::Redirect(detail_path(data.id)),
            Err(err) => Navigation::Alert(err.to_string()),
        }
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Navigation::Redirect(url) => Some(url),
            Navigation::Alert(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_redirects_to_detail_view() {
        let nav = Navigation::from_outcome(Ok(AddLinkData { id: 42 }));
        assert_eq!(nav, Navigation::Redirect("/detailview?id=42".to_string()));
        assert_eq!(nav.redirect_target(), Some("/detailview?id=42"));
    }

    #[test]
    fn failure_alerts_and_stays() {
        let nav = Navigation::from_outcome(Err(ClientError::Status {
            status: 500,
            message: "failed to scrape http://x: product name not found".to_string(),
        }));
        assert_eq!(nav.redirect_target(), None);
        match nav {
            Navigation::Alert(msg) => assert!(msg.contains("product name not found")),
            other => panic!("expected alert, got {other:?}"),
        }
    }
}
