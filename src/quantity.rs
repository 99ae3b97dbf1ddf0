//! The fixed vocabulary of water-quality quantities.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A measured water-quality quantity.
///
/// Variant order is the canonical column order used for exports and for the
/// default aligned schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Water temperature, ℃.
    WaterTemp,
    Ph,
    /// Electrical conductivity, μS/㎝.
    Conductivity,
    /// Dissolved oxygen, ㎎/L.
    DissolvedOxygen,
    /// Biochemical oxygen demand, ㎎/L.
    Bod,
    /// Chemical oxygen demand, ㎎/L.
    Cod,
    /// Suspended solids, ㎎/L.
    SuspendedSolids,
    /// Total nitrogen (T-N), ㎎/L.
    TotalNitrogen,
    /// Total phosphorus (T-P), ㎎/L.
    TotalPhosphorus,
    /// Total organic carbon (TOC), ㎎/L.
    Toc,
    /// Flow rate, ㎥/s.
    FlowRate,
    /// Chlorophyll-a, ㎎/㎥. Usually the prediction target.
    ChlorophyllA,
}

impl Quantity {
    pub const COUNT: usize = 12;

    pub const ALL: [Quantity; Quantity::COUNT] = [
        Quantity::WaterTemp,
        Quantity::Ph,
        Quantity::Conductivity,
        Quantity::DissolvedOxygen,
        Quantity::Bod,
        Quantity::Cod,
        Quantity::SuspendedSolids,
        Quantity::TotalNitrogen,
        Quantity::TotalPhosphorus,
        Quantity::Toc,
        Quantity::FlowRate,
        Quantity::ChlorophyllA,
    ];

    /// Position of this quantity in [`Quantity::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used in exports and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Quantity::WaterTemp => "water_temp",
            Quantity::Ph => "ph",
            Quantity::Conductivity => "conductivity",
            Quantity::DissolvedOxygen => "dissolved_oxygen",
            Quantity::Bod => "bod",
            Quantity::Cod => "cod",
            Quantity::SuspendedSolids => "suspended_solids",
            Quantity::TotalNitrogen => "total_nitrogen",
            Quantity::TotalPhosphorus => "total_phosphorus",
            Quantity::Toc => "toc",
            Quantity::FlowRate => "flow_rate",
            Quantity::ChlorophyllA => "chlorophyll_a",
        }
    }

    /// Normalized Korean label used by the measurement datasets.
    pub fn label(self) -> &'static str {
        match self {
            Quantity::WaterTemp => "수온",
            Quantity::Ph => "수소이온농도(ph)",
            Quantity::Conductivity => "전기전도도(EC)",
            Quantity::DissolvedOxygen => "용존산소(DO)",
            Quantity::Bod => "BOD",
            Quantity::Cod => "COD",
            Quantity::SuspendedSolids => "부유물질",
            Quantity::TotalNitrogen => "총질소(T-N)",
            Quantity::TotalPhosphorus => "총인(T-P)",
            Quantity::Toc => "총유기탄소(TOC)",
            Quantity::FlowRate => "유량",
            Quantity::ChlorophyllA => "클로로필-a",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string names no known quantity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quantity: {0}")]
pub struct UnknownQuantity(pub String);

impl FromStr for Quantity {
    type Err = UnknownQuantity;

    /// Accepts the column name or the Korean label; surrounding whitespace
    /// and ASCII case are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Quantity::ALL
            .into_iter()
            .find(|q| q.name().eq_ignore_ascii_case(s) || q.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownQuantity(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, q) in Quantity::ALL.iter().enumerate() {
            assert_eq!(q.index(), i);
        }
    }

    #[test]
    fn test_parse_name_and_label() {
        assert_eq!("water_temp".parse::<Quantity>(), Ok(Quantity::WaterTemp));
        assert_eq!("수온".parse::<Quantity>(), Ok(Quantity::WaterTemp));
        assert_eq!(" Chlorophyll_A ".parse::<Quantity>(), Ok(Quantity::ChlorophyllA));
        assert_eq!("클로로필-a".parse::<Quantity>(), Ok(Quantity::ChlorophyllA));
        assert_eq!("총인(T-P)".parse::<Quantity>(), Ok(Quantity::TotalPhosphorus));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "salinity".parse::<Quantity>().unwrap_err();
        assert_eq!(err, UnknownQuantity("salinity".to_string()));
    }

    #[test]
    fn test_serde_uses_column_names() {
        for q in Quantity::ALL {
            let json = serde_json::to_string(&q).unwrap();
            assert_eq!(json, format!("\"{}\"", q.name()));
        }
    }
}
