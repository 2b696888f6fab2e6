use serde::Serialize;

use crate::state::BotState;

pub const UNINVESTED_CASH_RATIO: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssetClass {
    Stocks,
    Crypto,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AllocationTemplate {
    class: AssetClass,
    percent: u32,
    symbol: &'static str,
    units: u32,
}

// The remaining 10% is the uninvested cash bucket and is not listed.
const ALLOCATIONS: [AllocationTemplate; 2] = [
    AllocationTemplate {
        class: AssetClass::Stocks,
        percent: 50,
        symbol: "CSCO",
        units: 100,
    },
    AllocationTemplate {
        class: AssetClass::Crypto,
        percent: 40,
        symbol: "BTC/USD",
        units: 3,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub symbol: String,
    pub units: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub class: AssetClass,
    pub value: f64,
    pub percent: u32,
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub equity: f64,
    pub pnl: f64,
    pub total_external_funding: f64,
    pub reinvested_profit: f64,
    pub initial_funding: f64,
    pub uninvested_cash: f64,
    pub allocations: Vec<Allocation>,
}

impl PortfolioSnapshot {
    pub fn from_state(state: &BotState) -> Self {
        let equity = state.equity;
        let allocations = ALLOCATIONS
            .iter()
            .map(|template| {
                let value = equity * f64::from(template.percent) / 100.0;
                Allocation {
                    class: template.class,
                    value,
                    percent: template.percent,
                    positions: vec![Position {
                        symbol: template.symbol.to_owned(),
                        units: template.units,
                        value,
                    }],
                }
            })
            .collect();

        Self {
            equity,
            pnl: state.pnl,
            total_external_funding: state.total_external_funding,
            reinvested_profit: state.reinvested_profit,
            initial_funding: state.initial_funding,
            uninvested_cash: equity * UNINVESTED_CASH_RATIO,
            allocations,
        }
    }

    pub fn invested_value(&self) -> f64 {
        self.allocations.iter().map(|allocation| allocation.value).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{AssetClass, PortfolioSnapshot};
    use crate::state::BotState;

    fn deployed(equity: f64) -> BotState {
        let mut state = BotState::new();
        state.deploy(equity, 0.0).unwrap();
        state
    }

    #[test]
    fn allocations_cover_ninety_percent_of_equity() {
        for equity in [1.0, 1500.0, 1234.5678, 98_765_432.1] {
            let snapshot = PortfolioSnapshot::from_state(&deployed(equity));

            let expected = equity * 0.9;
            assert!((snapshot.invested_value() - expected).abs() <= expected * 1e-12);
        }
    }

    #[test]
    fn uninvested_cash_is_ten_percent() {
        let snapshot = PortfolioSnapshot::from_state(&deployed(2000.0));

        assert_eq!(snapshot.uninvested_cash, 200.0);
    }

    #[test]
    fn each_class_holds_one_position_worth_the_class_value() {
        let snapshot = PortfolioSnapshot::from_state(&deployed(1000.0));

        assert_eq!(snapshot.allocations.len(), 2);
        assert_eq!(snapshot.allocations[0].class, AssetClass::Stocks);
        assert_eq!(snapshot.allocations[0].value, 500.0);
        assert_eq!(snapshot.allocations[0].positions[0].symbol, "CSCO");
        assert_eq!(snapshot.allocations[0].positions[0].units, 100);
        assert_eq!(snapshot.allocations[1].class, AssetClass::Crypto);
        assert_eq!(snapshot.allocations[1].value, 400.0);
        assert_eq!(snapshot.allocations[1].positions[0].symbol, "BTC/USD");
        assert_eq!(snapshot.allocations[1].positions[0].value, 400.0);
    }

    #[test]
    fn serializes_with_dashboard_field_names() {
        let snapshot = PortfolioSnapshot::from_state(&deployed(1000.0));

        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["totalExternalFunding"], 1000.0);
        assert_eq!(json["uninvestedCash"], 100.0);
        assert_eq!(json["allocations"][0]["class"], "Stocks");
        assert_eq!(json["allocations"][1]["percent"], 40);
        assert_eq!(json["allocations"][1]["positions"][0]["units"], 3);
    }
}
