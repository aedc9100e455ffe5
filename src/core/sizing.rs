// src/core/sizing.rs
//! Position sizing: turns margin balance into a leveraged order quantity.
//!
//! Pure and deterministic. Rounding is half away from zero
//! (`RoundingStrategy::MidpointAwayFromZero`) to `quantity_precision` places,
//! and the result keeps exactly that many places so `0.02` renders as `0.020`.

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use thiserror::Error;

const MAX_SCALE: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingInput {
    pub available_balance: Decimal,
    pub allocation_fraction: Decimal,
    pub leverage: u32,
    pub price: Decimal,
    pub min_quantity: Decimal,
    pub quantity_precision: u32,
}

/// Quantity that passed every sizing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderQuantity(Decimal);

impl OrderQuantity {
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for OrderQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Normal business outcome: nothing to trade this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingRejection {
    NoFunds,
    BelowMinimum {
        quantity: Decimal,
        min_quantity: Decimal,
    },
}

impl SizingRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            SizingRejection::NoFunds => "no funds",
            SizingRejection::BelowMinimum { .. } => "below minimum",
        }
    }
}

impl fmt::Display for SizingRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingRejection::NoFunds => f.write_str("no funds"),
            SizingRejection::BelowMinimum {
                quantity,
                min_quantity,
            } => write!(f, "below minimum ({} < {})", quantity, min_quantity),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingResult {
    Accepted(OrderQuantity),
    Rejected(SizingRejection),
}

/// Inputs the caller was supposed to have validated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizingError {
    #[error("price must be positive, got {0}")]
    NonPositivePrice(Decimal),

    #[error("leverage must be >= 1, got {0}")]
    InvalidLeverage(u32),

    #[error("allocation fraction must be in (0, 1], got {0}")]
    InvalidAllocation(Decimal),

    #[error("available balance cannot be negative, got {0}")]
    NegativeBalance(Decimal),

    #[error("minimum quantity must be positive, got {0}")]
    NonPositiveMinQuantity(Decimal),

    #[error("quantity precision {0} exceeds 28 decimal places")]
    PrecisionTooLarge(u32),

    #[error("arithmetic overflow while sizing position")]
    Overflow,
}

impl SizingInput {
    fn check_preconditions(&self) -> Result<(), SizingError> {
        if self.price <= Decimal::ZERO {
            return Err(SizingError::NonPositivePrice(self.price));
        }
        if self.leverage < 1 {
            return Err(SizingError::InvalidLeverage(self.leverage));
        }
        if self.allocation_fraction <= Decimal::ZERO || self.allocation_fraction > Decimal::ONE {
            return Err(SizingError::InvalidAllocation(self.allocation_fraction));
        }
        if self.available_balance < Decimal::ZERO {
            return Err(SizingError::NegativeBalance(self.available_balance));
        }
        if self.min_quantity <= Decimal::ZERO {
            return Err(SizingError::NonPositiveMinQuantity(self.min_quantity));
        }
        if self.quantity_precision > MAX_SCALE {
            return Err(SizingError::PrecisionTooLarge(self.quantity_precision));
        }
        Ok(())
    }
}

/// margin = balance * fraction, notional = margin * leverage,
/// quantity = round(notional / price, precision).
pub fn size_position(input: &SizingInput) -> Result<SizingResult, SizingError> {
    input.check_preconditions()?;

    if input.available_balance.is_zero() {
        return Ok(SizingResult::Rejected(SizingRejection::NoFunds));
    }

    let margin = input
        .available_balance
        .checked_mul(input.allocation_fraction)
        .ok_or(SizingError::Overflow)?;
    let notional = margin
        .checked_mul(Decimal::from(input.leverage))
        .ok_or(SizingError::Overflow)?;
    let raw_quantity = notional
        .checked_div(input.price)
        .ok_or(SizingError::Overflow)?;

    let mut quantity = raw_quantity.round_dp_with_strategy(
        input.quantity_precision,
        RoundingStrategy::MidpointAwayFromZero,
    );
    quantity.rescale(input.quantity_precision);

    if quantity < input.min_quantity {
        return Ok(SizingResult::Rejected(SizingRejection::BelowMinimum {
            quantity,
            min_quantity: input.min_quantity,
        }));
    }

    Ok(SizingResult::Accepted(OrderQuantity(quantity)))
}
