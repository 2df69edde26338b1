use serde::{Deserialize, Serialize};

/// How prices are shown: a marker in front and a thousands separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub marker: String,
    pub separator: char,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            marker: "Rp ".to_string(),
            separator: '.',
        }
    }
}

impl CurrencyFormat {
    pub fn format(&self, amount: i64) -> String {
        let digits = amount.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(self.separator);
            }
            grouped.push(ch);
        }

        let sign = if amount < 0 { "-" } else { "" };
        format!("{sign}{}{grouped}", self.marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_with_marker() {
        let rupiah = CurrencyFormat::default();
        assert_eq!(rupiah.format(1_250_000), "Rp 1.250.000");
        assert_eq!(rupiah.format(999), "Rp 999");
        assert_eq!(rupiah.format(1_000), "Rp 1.000");
        assert_eq!(rupiah.format(0), "Rp 0");
        assert_eq!(rupiah.format(-15_500), "-Rp 15.500");
    }

    #[test]
    fn honours_custom_marker_and_separator() {
        let dollars = CurrencyFormat {
            marker: "$".to_string(),
            separator: ',',
        };
        assert_eq!(dollars.format(12_345_678), "$12,345,678");
    }
}
