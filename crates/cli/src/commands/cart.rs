//! Cart management and checkout.

use clap::Subcommand;

use levelup_client::{Checkout, PointsOutcome, Receipt};
use levelup_core::ProductCode;

use super::{Context, print_cart};

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product code
        code: ProductCode,
    },
    /// Remove units of a product
    Remove {
        /// Product code
        code: ProductCode,

        /// Units to remove
        #[arg(short, long, default_value_t = 1, conflicts_with = "all")]
        quantity: u32,

        /// Remove the whole line
        #[arg(long)]
        all: bool,
    },
    /// Empty the cart
    Clear,
    /// Pay for the cart
    Checkout {
        /// Spend loyalty points for a discount first
        #[arg(long)]
        redeem: bool,
    },
}

pub async fn run(ctx: &mut Context, action: CartAction) -> levelup_client::Result<()> {
    match action {
        CartAction::Show => print_cart(ctx.store.cart()),
        CartAction::Add { code } => {
            let product = ctx.api().get_product(&code).await?;
            let cart = ctx.store.add_to_cart(&product);
            let quantity = cart.line(&code).map_or(0, |line| line.quantity);
            println!("Added {} (now {quantity} in cart)", product.name);
        }
        CartAction::Remove {
            code,
            quantity,
            all,
        } => {
            let Some(line) = ctx.store.cart().line(&code) else {
                println!("{code} is not in your cart");
                return Ok(());
            };
            let quantity = if all { line.quantity } else { quantity };
            print_cart(ctx.store.remove_from_cart(&code, quantity));
        }
        CartAction::Clear => {
            ctx.store.clear_cart();
            println!("Cart cleared");
        }
        CartAction::Checkout { redeem } => {
            let api = ctx.api();
            let mut checkout = Checkout::new();
            if redeem {
                let user = checkout.redeem_points(&mut ctx.store, &api).await?;
                println!("Discount applied, {} points left", user.points);
            }
            let receipt = checkout.pay(&mut ctx.store, &api).await?;
            print_receipt(&receipt);
        }
    }
    Ok(())
}

fn print_receipt(receipt: &Receipt) {
    let quote = &receipt.quote;
    println!("Paid for {} item(s)", receipt.items);
    println!("  subtotal: {}", quote.subtotal);
    if quote.discount > levelup_core::Price::ZERO {
        println!("  discount: -{}", quote.discount);
    }
    println!("  total:    {}", quote.total);

    match &receipt.points {
        PointsOutcome::Guest => println!("Log in next time to earn points."),
        PointsOutcome::BelowMinimum => {}
        PointsOutcome::Credited(points) => println!("You earned {points} points!"),
        PointsOutcome::Failed { points, reason } => {
            println!("Could not credit {points} points: {reason}");
        }
    }
}
