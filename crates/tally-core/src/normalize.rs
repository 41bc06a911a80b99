//! Title normalization for statement descriptions
//!
//! Bank exports append installment counters and payment-provider tags to
//! merchant names ("Netflix - Parcela 2/3", "Loja - NuPay"). Stripping those
//! suffixes lets every installment of one purchase collapse onto a single
//! canonical title.

/// Suffix that introduces an installment counter
pub const INSTALLMENT_MARKER: &str = " - Parcela";

/// Suffix added when the purchase went through a payment provider
pub const PROVIDER_MARKER: &str = " - NuPay";

/// Description of incoming payments, which are not expenses
pub const INCOMING_PAYMENT: &str = "Pagamento recebido";

/// Markers used to canonicalize titles and filter non-expense rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRules {
    pub installment_marker: String,
    pub provider_marker: String,
    pub incoming_payment: String,
}

impl Default for TitleRules {
    fn default() -> Self {
        Self {
            installment_marker: INSTALLMENT_MARKER.to_string(),
            provider_marker: PROVIDER_MARKER.to_string(),
            incoming_payment: INCOMING_PAYMENT.to_string(),
        }
    }
}

impl TitleRules {
    /// Truncate at the installment marker, then at the provider marker
    ///
    /// The provider check runs against the already-truncated string.
    pub fn normalize<'a>(&self, raw: &'a str) -> &'a str {
        let title = truncate_at(raw, &self.installment_marker);
        truncate_at(title, &self.provider_marker)
    }

    /// Whether a normalized title is an incoming payment rather than an expense
    pub fn is_incoming_payment(&self, title: &str) -> bool {
        title == self.incoming_payment
    }
}

fn truncate_at<'a>(s: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return s;
    }
    match s.find(marker) {
        Some(idx) => &s[..idx],
        None => s,
    }
}

/// Normalize a description with the default rules
pub fn normalize_title(raw: &str) -> String {
    TitleRules::default().normalize(raw).to_string()
}
