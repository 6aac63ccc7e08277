//! Checkout and loyalty points.
//!
//! Logged-in customers earn one point per `PESOS_PER_POINT` pesos paid and
//! can spend `REDEEM_COST` points for a `DISCOUNT_PERCENT`% discount on the
//! current purchase. Point balances live on the backend; after every
//! adjustment the returned user record is installed into the session so
//! observers see the new balance.

use thiserror::Error;

use levelup_core::{AuthPayload, InvalidLoginPayload, Price, UserRecord};

use crate::api::{ApiClient, ApiError};
use crate::storage::KeyValueStorage;
use crate::store::SessionCartStore;

/// Points spent by one redemption.
pub const REDEEM_COST: u32 = 500;

/// Discount granted by a redemption, in percent.
pub const DISCOUNT_PERCENT: u32 = 10;

/// Pesos paid per point earned.
pub const PESOS_PER_POINT: u32 = 1000;

/// Errors that stop a checkout step.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to pay for.
    #[error("your cart is empty")]
    EmptyCart,

    /// Redemption requires a logged-in user.
    #[error("log in to redeem points")]
    NotAuthenticated,

    /// Not enough points to redeem.
    #[error("you need {needed} points to redeem, you have {available}")]
    InsufficientPoints {
        /// Points required.
        needed: u32,
        /// Current balance.
        available: u32,
    },

    /// A discount is already applied to this checkout.
    #[error("a discount has already been applied")]
    DiscountAlreadyApplied,

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The refreshed session could not be installed.
    #[error(transparent)]
    Session(#[from] InvalidLoginPayload),
}

/// Price breakdown for the current cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// Sum of line totals.
    pub subtotal: Price,
    /// Amount taken off by a redeemed discount.
    pub discount: Price,
    /// What the customer pays.
    pub total: Price,
}

/// What happened to loyalty points on a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointsOutcome {
    /// No user was logged in.
    Guest,
    /// The total was too small to earn a point.
    BelowMinimum,
    /// Points were credited; the session holds the new balance.
    Credited(u32),
    /// Crediting failed; the purchase still went through.
    Failed {
        /// Points that should have been credited.
        points: u32,
        /// Why crediting failed.
        reason: String,
    },
}

/// Result of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Amounts charged.
    pub quote: Quote,
    /// Units purchased.
    pub items: u32,
    /// Loyalty points result.
    pub points: PointsOutcome,
}

/// One checkout in progress: tracks whether a discount was redeemed.
#[derive(Debug, Default)]
pub struct Checkout {
    discount_applied: bool,
}

impl Checkout {
    /// Start a checkout with no discount.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            discount_applied: false,
        }
    }

    /// Resume a checkout whose discount state was tracked elsewhere.
    #[must_use]
    pub const fn with_discount(discount_applied: bool) -> Self {
        Self { discount_applied }
    }

    /// Whether a discount has been redeemed.
    #[must_use]
    pub const fn discount_applied(&self) -> bool {
        self.discount_applied
    }

    /// Current price breakdown.
    #[must_use]
    pub fn quote<S: KeyValueStorage>(&self, store: &SessionCartStore<S>) -> Quote {
        quote(store.cart().subtotal(), self.discount_applied)
    }

    /// Spend `REDEEM_COST` points for a discount on this checkout.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` when there is nothing to discount,
    /// `NotAuthenticated` without a session, `InsufficientPoints` when the
    /// balance is short, and `DiscountAlreadyApplied` on a second redemption.
    /// No points are spent in any of these cases.
    pub async fn redeem_points<S: KeyValueStorage>(
        &mut self,
        store: &mut SessionCartStore<S>,
        api: &ApiClient,
    ) -> Result<UserRecord, CheckoutError> {
        if store.cart().is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let (token, user) = match (store.session().token(), store.session().user()) {
            (Some(token), Some(user)) => (token.to_owned(), user),
            _ => return Err(CheckoutError::NotAuthenticated),
        };
        if user.points < REDEEM_COST {
            return Err(CheckoutError::InsufficientPoints {
                needed: REDEEM_COST,
                available: user.points,
            });
        }
        if self.discount_applied {
            return Err(CheckoutError::DiscountAlreadyApplied);
        }

        let updated = api
            .with_token(token.as_str())
            .adjust_points(-i64::from(REDEEM_COST))
            .await?;
        store.login(AuthPayload::new(token, updated.clone()))?;
        self.discount_applied = true;

        tracing::info!(
            spent = REDEEM_COST,
            balance = updated.points,
            "Points redeemed for discount"
        );
        Ok(updated)
    }

    /// Pay for the cart.
    ///
    /// Credits earned points when logged in, then clears the cart and the
    /// discount. A failure to credit points is reported in the receipt and
    /// does not fail the purchase.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to pay for.
    pub async fn pay<S: KeyValueStorage>(
        &mut self,
        store: &mut SessionCartStore<S>,
        api: &ApiClient,
    ) -> Result<Receipt, CheckoutError> {
        if store.cart().is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let quote = self.quote(store);
        let items = store.cart().item_count();
        let points = Self::credit_points(store, api, quote.total).await;

        store.clear_cart();
        self.discount_applied = false;

        tracing::info!(total = %quote.total, items, ?points, "Purchase completed");
        Ok(Receipt {
            quote,
            items,
            points,
        })
    }

    async fn credit_points<S: KeyValueStorage>(
        store: &mut SessionCartStore<S>,
        api: &ApiClient,
        total: Price,
    ) -> PointsOutcome {
        let Some(token) = store.session().token().map(str::to_owned) else {
            return PointsOutcome::Guest;
        };
        if store.session().user().is_none() {
            return PointsOutcome::Guest;
        }

        let earned = points_earned(total);
        if earned == 0 {
            return PointsOutcome::BelowMinimum;
        }

        let result = api
            .with_token(token.as_str())
            .adjust_points(i64::from(earned))
            .await
            .map_err(CheckoutError::from)
            .and_then(|updated| {
                store
                    .login(AuthPayload::new(token, updated))
                    .map_err(CheckoutError::from)
            });

        match result {
            Ok(()) => PointsOutcome::Credited(earned),
            Err(e) => {
                tracing::warn!(points = earned, error = %e, "Failed to credit points");
                PointsOutcome::Failed {
                    points: earned,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Price breakdown for `subtotal`, with or without the redemption discount.
#[must_use]
pub fn quote(subtotal: Price, discount_applied: bool) -> Quote {
    let discount = if discount_applied {
        subtotal.percent(DISCOUNT_PERCENT)
    } else {
        Price::ZERO
    };
    Quote {
        subtotal,
        discount,
        total: subtotal.saturating_sub(discount),
    }
}

/// Points earned for paying `total`.
#[must_use]
pub fn points_earned(total: Price) -> u32 {
    total.whole_units_of(PESOS_PER_POINT)
}
