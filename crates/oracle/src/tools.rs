use rand::Rng;
use tracing::info;

const KNOWN_PRICES: [(&str, f64); 4] = [
    ("CSCO", 78.14),
    ("PLTR", 24.50),
    ("BTC/USD", 72104.50),
    ("NVDA", 451.23),
];

pub const INSIDER_SIGNAL_PREFIX: &str = "Signal Found:";

/// Current market price for `ticker`. Unknown tickers get a simulated quote.
pub fn realtime_price(ticker: &str) -> f64 {
    info!(tool = "realtime_price", ticker, "agent tool called");
    let upper = ticker.to_uppercase();
    KNOWN_PRICES
        .iter()
        .find(|(symbol, _)| *symbol == upper)
        .map(|(_, price)| *price)
        .unwrap_or_else(|| rand::thread_rng().gen_range(50.0..500.0))
}

/// Qualitative research, news and filings matching `query`.
pub fn search_research_database(query: &str) -> String {
    info!(tool = "search_research_database", query, "agent tool called");
    let lower = query.to_lowercase();
    if lower.contains("csco") || lower.contains("cisco") {
        return "Found 3 documents: 1) 'US-China Tariff Talks Progressing, Tech Sector Impacted'. \
                2) 'CSCO reports Q3 earnings beat'. \
                3) 'SEC Filing: Cisco Systems, Inc. (CSCO) Form 8-K'."
            .to_owned();
    }
    "No specific research found. General market sentiment is cautious.".to_owned()
}

/// Trades disclosed by politically-exposed persons for `ticker`.
pub fn search_capitol_trades(ticker: &str) -> String {
    info!(tool = "search_capitol_trades", ticker, "agent tool called");
    if ticker.eq_ignore_ascii_case("CSCO") {
        return format!(
            "{INSIDER_SIGNAL_PREFIX} 'Nancy Pelosi (House) reports purchase of +10,000 units of CSCO.' \
             This is a strong correlated signal."
        );
    }
    "No unusual political/insider trades detected for this ticker.".to_owned()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchFindings {
    pub ticker: String,
    pub price: f64,
    pub research: String,
    pub insider_trades: String,
}

impl ResearchFindings {
    /// Consults every tool for `ticker`.
    pub fn gather(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_owned(),
            price: realtime_price(ticker),
            research: search_research_database(ticker),
            insider_trades: search_capitol_trades(ticker),
        }
    }

    pub fn has_insider_signal(&self) -> bool {
        self.insider_trades.starts_with(INSIDER_SIGNAL_PREFIX)
    }

    pub fn price_report(&self) -> String {
        format!("The current price of {} is ${:.2}.", self.ticker, self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::{realtime_price, search_capitol_trades, search_research_database, ResearchFindings};

    #[test]
    fn known_tickers_have_fixed_prices() {
        assert_eq!(realtime_price("csco"), 78.14);
        assert_eq!(realtime_price("BTC/USD"), 72104.50);
    }

    #[test]
    fn unknown_tickers_get_a_bounded_quote() {
        let price = realtime_price("ZZZZ");

        assert!((50.0..500.0).contains(&price));
    }

    #[test]
    fn research_matches_company_name() {
        assert!(search_research_database("Cisco outlook").starts_with("Found 3 documents"));
        assert!(search_research_database("TSLA").starts_with("No specific research"));
    }

    #[test]
    fn insider_signal_only_for_csco() {
        let csco = ResearchFindings::gather("CSCO");
        let nvda = ResearchFindings::gather("NVDA");

        assert!(csco.has_insider_signal());
        assert!(!nvda.has_insider_signal());
        assert!(search_capitol_trades("nvda").starts_with("No unusual"));
        assert_eq!(nvda.price_report(), "The current price of NVDA is $451.23.");
    }
}
