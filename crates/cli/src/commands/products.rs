//! Catalog browsing.

use clap::Subcommand;

use levelup_core::ProductCode;

use super::Context;

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List every product
    List,
    /// Show one product
    Show {
        /// Product code
        code: ProductCode,
    },
}

pub async fn run(ctx: &Context, action: ProductsAction) -> levelup_client::Result<()> {
    match action {
        ProductsAction::List => {
            let products = ctx.api().list_products().await?;
            for product in &products {
                println!(
                    "{:<10} {:<40} {:>10}  {}",
                    product.code,
                    product.name,
                    product.price.to_string(),
                    product.stars()
                );
            }
            println!("{} product(s)", products.len());
        }
        ProductsAction::Show { code } => {
            let product = ctx.api().get_product(&code).await?;
            println!("{} ({})", product.name, product.code);
            println!("  price:  {}", product.price);
            println!("  rating: {} ({} reviews)", product.stars(), product.reviews);
            if let Some(description) = &product.description {
                println!();
                println!("{description}");
            }
        }
    }
    Ok(())
}
