use std::fmt::{Display, Formatter};

use serde::Deserialize;

/// Average power over a charting slot.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, derive_more::Add)]
pub struct Megawatts(pub f64);

impl Megawatts {
    pub const ZERO: Self = Self(0.0);
}

impl std::iter::Sum for Megawatts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|megawatts| megawatts.0).sum())
    }
}

impl Display for Megawatts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} MW", self.0)
    }
}

/// Energy produced over one 30-minute slot, as published by the portal.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct SlotKilowattHours(pub i64);

impl SlotKilowattHours {
    /// kWh over half an hour is twice that figure in kW.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn to_megawatts(self) -> Megawatts {
        Megawatts(self.0 as f64 * 2.0 / 1000.0)
    }
}

impl Display for SlotKilowattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} kWh", self.0)
    }
}

/// Authorized output as the portal publishes it, in units of 10,000 kW (万kW).
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Deserialize)]
pub struct TenThousandKilowatts(pub f64);

impl TenThousandKilowatts {
    #[must_use]
    pub fn to_megawatts(self) -> Megawatts {
        Megawatts(self.0 * 10.0)
    }
}

impl Display for TenThousandKilowatts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}万kW", self.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    #[expect(clippy::cast_precision_loss)]
    fn test_slot_kilowatt_hours_to_megawatts_exact() {
        for kwh in [0_i64, 1, 500, 75_000, 123_456] {
            assert_eq!(SlotKilowattHours(kwh).to_megawatts().0, kwh as f64 * 2.0 / 1000.0);
        }
    }

    #[test]
    fn test_slot_kilowatt_hours_to_megawatts_zero() {
        assert_eq!(SlotKilowattHours(0).to_megawatts(), Megawatts::ZERO);
    }

    #[test]
    fn test_authorized_output_to_megawatts() {
        // 135.6万kW is 1356 MW.
        assert_relative_eq!(TenThousandKilowatts(135.6).to_megawatts().0, 1356.0);
    }

    #[test]
    fn test_megawatts_sum() {
        let total: Megawatts = [Megawatts(1.5), Megawatts(2.5)].into_iter().sum();
        assert_relative_eq!(total.0, 4.0);
    }
}
