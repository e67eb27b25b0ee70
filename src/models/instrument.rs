use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Upstream source class an instrument is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    Fiat,
    Crypto,
    Metal,
    Index,
    Commodity,
}

impl AssetClass {
    /// Aggregation order.
    pub const ALL: [AssetClass; 5] = [
        AssetClass::Fiat,
        AssetClass::Crypto,
        AssetClass::Metal,
        AssetClass::Index,
        AssetClass::Commodity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetClass::Fiat => "fiat",
            AssetClass::Crypto => "crypto",
            AssetClass::Metal => "metal",
            AssetClass::Index => "index",
            AssetClass::Commodity => "commodity",
        }
    }
}

/// Tolerance and precision bucket used when checking targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTier {
    /// Relative tolerance, 2 decimals.
    HighValue,
    /// Absolute tolerance 0.0001, 4 decimals.
    LowUnit,
    /// Absolute tolerance 0.00005, 5 decimals.
    Standard,
}

/// How close the live price must be to the target to count as reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tolerance {
    Relative(Decimal),
    Absolute(Decimal),
}

impl PriceTier {
    pub fn tolerance(self) -> Tolerance {
        match self {
            PriceTier::HighValue => Tolerance::Relative(dec!(0.0001)),
            PriceTier::LowUnit => Tolerance::Absolute(dec!(0.0001)),
            PriceTier::Standard => Tolerance::Absolute(dec!(0.00005)),
        }
    }

    pub fn precision(self) -> usize {
        match self {
            PriceTier::HighValue => 2,
            PriceTier::LowUnit => 4,
            PriceTier::Standard => 5,
        }
    }
}

impl Tolerance {
    /// Both bounds are exclusive: a distance exactly at the tolerance is a miss.
    /// The relative bound is scaled onto the target so tiny targets cannot overflow.
    pub fn is_hit(self, current: Decimal, target: Decimal) -> bool {
        if target <= Decimal::ZERO {
            return false;
        }
        let distance = (current - target).abs();
        match self {
            Tolerance::Relative(limit) => distance < limit * target,
            Tolerance::Absolute(limit) => distance < limit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentSpec {
    pub symbol: String,
    pub class: AssetClass,
    pub tier: PriceTier,
    pub default_price: Decimal,
    /// Exclusive plausibility bounds for provider answers.
    pub sanity: (Decimal, Decimal),
    /// Decimals used when listing live rates.
    pub quote_precision: usize,
    /// Example target shown in the creation flow.
    pub hint: String,
    /// Chart-style ticker (`^GSPC`, `CL=F`) for index/commodity providers.
    pub market_ticker: Option<String>,
}

impl InstrumentSpec {
    pub fn new(
        symbol: &str,
        class: AssetClass,
        tier: PriceTier,
        default_price: Decimal,
        sanity: (Decimal, Decimal),
        quote_precision: usize,
        hint: &str,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            class,
            tier,
            default_price,
            sanity,
            quote_precision,
            hint: hint.to_string(),
            market_ticker: None,
        }
    }

    pub fn ticker(mut self, ticker: &str) -> Self {
        self.market_ticker = Some(ticker.to_string());
        self
    }

    /// `EUR/USD` -> `EUR`; index symbols without a slash return themselves.
    pub fn base(&self) -> &str {
        self.symbol.split('/').next().unwrap_or(&self.symbol)
    }

    pub fn quote(&self) -> &str {
        self.symbol.split('/').nth(1).unwrap_or("USD")
    }

    pub fn is_plausible(&self, price: Decimal) -> bool {
        price > Decimal::ZERO && price > self.sanity.0 && price < self.sanity.1
    }
}

/// The set of instruments the bot knows how to fetch and offer.
#[derive(Debug, Clone)]
pub struct Catalog {
    specs: Vec<InstrumentSpec>,
}

impl Catalog {
    pub fn new(specs: Vec<InstrumentSpec>) -> Self {
        Self { specs }
    }

    pub fn standard() -> Self {
        use AssetClass::*;
        use PriceTier::*;

        let specs = vec![
            InstrumentSpec::new("EUR/USD", Fiat, Standard, dec!(1.08), (dec!(0.5), dec!(2)), 4, "1.10"),
            InstrumentSpec::new("GBP/USD", Fiat, Standard, dec!(1.26), (dec!(0.5), dec!(2.5)), 4, "1.30"),
            InstrumentSpec::new("USD/JPY", Fiat, Standard, dec!(155.0), (dec!(50), dec!(400)), 4, "150"),
            InstrumentSpec::new("USD/RUB", Fiat, Standard, dec!(90.0), (dec!(20), dec!(500)), 4, "90"),
            InstrumentSpec::new("EUR/GBP", Fiat, Standard, dec!(0.87), (dec!(0.4), dec!(1.5)), 4, "0.87"),
            InstrumentSpec::new("BTC/USD", Crypto, HighValue, dec!(67000.0), (dec!(1000), dec!(10000000)), 2, "67000"),
            InstrumentSpec::new("ETH/USD", Crypto, HighValue, dec!(1950.0), (dec!(10), dec!(1000000)), 2, "1950"),
            InstrumentSpec::new("SOL/USD", Crypto, Standard, dec!(84.0), (dec!(0.1), dec!(100000)), 2, "84"),
            InstrumentSpec::new("BNB/USD", Crypto, Standard, dec!(610.0), (dec!(1), dec!(100000)), 2, "610"),
            InstrumentSpec::new("LINK/USD", Crypto, Standard, dec!(8.6), (dec!(0.01), dec!(10000)), 2, "8.6"),
            InstrumentSpec::new("TON/USD", Crypto, LowUnit, dec!(1.35), (dec!(0.001), dec!(1000)), 4, "1.35"),
            InstrumentSpec::new("XRP/USD", Crypto, LowUnit, dec!(1.40), (dec!(0.001), dec!(1000)), 4, "1.40"),
            InstrumentSpec::new("DOGE/USD", Crypto, LowUnit, dec!(0.098), (dec!(0.0001), dec!(100)), 4, "0.098"),
            InstrumentSpec::new("AVAX/USD", Crypto, Standard, dec!(9.1), (dec!(0.01), dec!(10000)), 2, "9.1"),
            InstrumentSpec::new("XAU/USD", Metal, HighValue, dec!(2900.0), (dec!(1000), dec!(10000)), 2, "2900"),
            InstrumentSpec::new("XAG/USD", Metal, Standard, dec!(31.0), (dec!(5), dec!(500)), 2, "31"),
            InstrumentSpec::new("XPT/USD", Metal, HighValue, dec!(1000.0), (dec!(300), dec!(10000)), 2, "1000"),
            InstrumentSpec::new("SPX", Index, HighValue, dec!(5000.0), (dec!(1000), dec!(50000)), 2, "5000").ticker("^GSPC"),
            InstrumentSpec::new("NDX", Index, HighValue, dec!(18000.0), (dec!(2000), dec!(200000)), 2, "18000").ticker("^NDX"),
            InstrumentSpec::new("DJI", Index, HighValue, dec!(39000.0), (dec!(5000), dec!(400000)), 2, "39000").ticker("^DJI"),
            InstrumentSpec::new("WTI/USD", Commodity, Standard, dec!(78.0), (dec!(5), dec!(500)), 2, "78").ticker("CL=F"),
            InstrumentSpec::new("BRENT/USD", Commodity, Standard, dec!(82.0), (dec!(5), dec!(500)), 2, "82").ticker("BZ=F"),
        ];

        Self::new(specs)
    }

    pub fn all(&self) -> &[InstrumentSpec] {
        &self.specs
    }

    pub fn get(&self, symbol: &str) -> Option<&InstrumentSpec> {
        self.specs.iter().find(|s| s.symbol == symbol)
    }

    pub fn of_class(&self, class: AssetClass) -> Vec<InstrumentSpec> {
        self.specs.iter().filter(|s| s.class == class).cloned().collect()
    }

    /// Unknown symbols fall into the standard bucket.
    pub fn tier(&self, symbol: &str) -> PriceTier {
        self.get(symbol).map(|s| s.tier).unwrap_or(PriceTier::Standard)
    }

    pub fn defaults(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.specs.iter().map(|s| (s.symbol.as_str(), s.default_price))
    }
}

/// Rounds half away from zero, then pads to exactly `precision` decimals.
pub fn format_price(price: Decimal, precision: usize) -> String {
    let rounded = price.round_dp_with_strategy(precision as u32, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", precision, rounded)
}
