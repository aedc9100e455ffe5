// src/core/pipeline.rs
use crate::config::{ClockConfig, TradingConfig};
use crate::connectors::traits::ExchangeClient;
use crate::core::clock::check_clock;
use crate::core::sizing::{size_position, SizingInput, SizingRejection, SizingResult};
use crate::error::ExchangeError;
use crate::types::{OrderAccepted, OrderOutcome, OrderRequest, OrderType};
use rust_decimal::Decimal;
use std::fmt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Step at which a run can stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Leverage,
    Balance,
    Price,
    Sizing,
    Order,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::Leverage => "leverage",
            PipelineStep::Balance => "balance",
            PipelineStep::Price => "price",
            PipelineStep::Sizing => "sizing",
            PipelineStep::Order => "order",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start → LeverageSet → BalanceFetched → PriceFetched → Sized → Submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    LeverageSet,
    BalanceFetched,
    PriceFetched,
    Sized,
    Submitted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepFailure {
    /// No answer from the exchange (timeout, DNS, TLS).
    Transport(String),
    /// The exchange answered with an error.
    Exchange { code: Option<i64>, message: String },
    /// Expected business outcome, not a system error.
    Sizing(SizingRejection),
    OrderRejected(String),
    InvalidQuote(Decimal),
    Precondition(String),
}

impl StepFailure {
    pub fn is_business(&self) -> bool {
        matches!(self, StepFailure::Sizing(_))
    }
}

impl From<ExchangeError> for StepFailure {
    fn from(err: ExchangeError) -> Self {
        if err.is_transport() {
            return StepFailure::Transport(err.to_string());
        }
        let code = err.code();
        let message = match err {
            ExchangeError::Api { msg, .. } => msg,
            other => other.to_string(),
        };
        StepFailure::Exchange { code, message }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepFailure::Transport(msg) => write!(f, "transport: {}", msg),
            StepFailure::Exchange {
                code: Some(code),
                message,
            } => write!(f, "exchange error {}: {}", code, message),
            StepFailure::Exchange {
                code: None,
                message,
            } => write!(f, "exchange error: {}", message),
            StepFailure::Sizing(rejection) => write!(f, "{}", rejection),
            StepFailure::OrderRejected(reason) => write!(f, "order rejected: {}", reason),
            StepFailure::InvalidQuote(price) => write!(f, "invalid price quote {}", price),
            StepFailure::Precondition(msg) => write!(f, "precondition violated: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Succeeded(OrderAccepted),
    Failed {
        step: PipelineStep,
        failure: StepFailure,
    },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Succeeded(_))
    }

    pub fn failed_step(&self) -> Option<PipelineStep> {
        match self {
            PipelineOutcome::Failed { step, .. } => Some(*step),
            PipelineOutcome::Succeeded(_) => None,
        }
    }
}

impl fmt::Display for PipelineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineOutcome::Succeeded(order) => write!(f, "succeeded: {}", order),
            PipelineOutcome::Failed { step, failure } => {
                write!(f, "failed at {}: {}", step, failure)
            }
        }
    }
}

type StepResult<T> = Result<T, (PipelineStep, StepFailure)>;

/// Leverage → balance → price → size → submit. Stops at the first failure and
/// never rolls back: leverage stays changed when a later step fails.
pub struct OrderPipeline {
    client: Box<dyn ExchangeClient>,
    trading: TradingConfig,
    clock: ClockConfig,
}

impl OrderPipeline {
    pub fn new(client: Box<dyn ExchangeClient>, trading: TradingConfig, clock: ClockConfig) -> Self {
        Self {
            client,
            trading,
            clock,
        }
    }

    /// Clock check (best-effort), then the order sequence, then the report.
    pub async fn execute(&self) -> PipelineOutcome {
        check_clock(self.client.as_ref(), &self.clock).await;

        let outcome = self.run().await;
        report(&outcome);
        outcome
    }

    pub async fn run(&self) -> PipelineOutcome {
        match self.run_steps().await {
            Ok(order) => PipelineOutcome::Succeeded(order),
            Err((step, failure)) => PipelineOutcome::Failed { step, failure },
        }
    }

    async fn run_steps(&self) -> StepResult<OrderAccepted> {
        let t = &self.trading;
        enter(PipelineState::Start);

        // 1. Плечо выставляем всегда, повторный вызов с тем же значением безопасен
        let ack = self
            .client
            .set_leverage(&t.symbol, t.leverage)
            .await
            .map_err(|e| (PipelineStep::Leverage, StepFailure::from(e)))?;
        info!("⚙️ Leverage set: {}x on {}", ack.leverage, ack.symbol);
        if let Some(max_notional) = ack.max_notional {
            debug!("Max notional at {}x: {}", ack.leverage, max_notional);
        }
        enter(PipelineState::LeverageSet);

        // 2. Баланс
        let balances = self
            .client
            .balances()
            .await
            .map_err(|e| (PipelineStep::Balance, StepFailure::from(e)))?;
        let available = match balances.get(&t.quote_asset) {
            Some(amount) => *amount,
            None => {
                debug!("{} not present in balances, treating as zero", t.quote_asset);
                Decimal::ZERO
            }
        };
        info!("💰 Available balance: {} {}", available, t.quote_asset);
        enter(PipelineState::BalanceFetched);

        // 3. Цена
        let quote = self
            .client
            .price(&t.symbol)
            .await
            .map_err(|e| (PipelineStep::Price, StepFailure::from(e)))?;
        if quote.price <= Decimal::ZERO {
            return Err((PipelineStep::Price, StepFailure::InvalidQuote(quote.price)));
        }
        info!("📈 Price: {} = {} (t={})", quote.symbol, quote.price, quote.timestamp);
        enter(PipelineState::PriceFetched);

        // 4. Расчет объема
        let input = SizingInput {
            available_balance: available,
            allocation_fraction: t.allocation_fraction,
            leverage: t.leverage,
            price: quote.price,
            min_quantity: t.min_quantity,
            quantity_precision: t.quantity_precision,
        };
        let quantity = match size_position(&input) {
            Ok(SizingResult::Accepted(quantity)) => quantity,
            Ok(SizingResult::Rejected(rejection)) => {
                return Err((PipelineStep::Sizing, StepFailure::Sizing(rejection)));
            }
            Err(e) => {
                return Err((PipelineStep::Sizing, StepFailure::Precondition(e.to_string())));
            }
        };
        info!(
            "📐 Sized: margin {} x{} -> qty {}",
            available * t.allocation_fraction,
            t.leverage,
            quantity
        );
        enter(PipelineState::Sized);

        // 5. Отправка
        let order = OrderRequest {
            symbol: t.symbol.clone(),
            side: t.side,
            order_type: OrderType::Market,
            quantity,
            client_order_id: Uuid::new_v4().to_string(),
        };
        let outcome = self
            .client
            .place_market_order(&order)
            .await
            .map_err(|e| (PipelineStep::Order, StepFailure::from(e)))?;
        enter(PipelineState::Submitted);

        match outcome {
            OrderOutcome::Accepted(accepted) => Ok(accepted),
            OrderOutcome::Rejected { reason } => {
                Err((PipelineStep::Order, StepFailure::OrderRejected(reason)))
            }
        }
    }
}

fn enter(state: PipelineState) {
    debug!(?state, "pipeline state");
}

fn report(outcome: &PipelineOutcome) {
    match outcome {
        PipelineOutcome::Succeeded(order) => info!("✅ Order accepted: {}", order),
        PipelineOutcome::Failed { step, failure } if failure.is_business() => {
            warn!(step = %step, "⚠️ Entry skipped: {}", failure)
        }
        PipelineOutcome::Failed { step, failure } => {
            error!(step = %step, "❌ Pipeline failed: {}", failure)
        }
    }
}
