use std::error::Error;

use clap::Subcommand;
use pomofocus_core::gateway::PRODUCTS;
use pomofocus_core::{Entitlement, EntitlementGateway, PurchaseError};
use serde_json::json;

use super::print_json;
use crate::app::App;

#[derive(Subcommand)]
pub enum PremiumAction {
    /// Current entitlement and available products
    Status,
    /// Buy a product (premium_monthly, premium_yearly, premium_lifetime)
    Purchase {
        product: String,
        /// Behave as if the purchase sheet was dismissed
        #[arg(long, hide = true)]
        cancel: bool,
    },
    /// Restore earlier purchases
    Restore,
}

pub fn run(app: &App, action: PremiumAction) -> Result<(), Box<dyn Error>> {
    let gateway = app.entitlements();

    match action {
        PremiumAction::Status => {
            let entitlement = gateway.entitlement()?;
            print_json(&json!({
                "entitlement": entitlement,
                "products": PRODUCTS,
            }))?;
        }
        PremiumAction::Purchase { product, cancel } => {
            if cancel {
                gateway.fail_next(PurchaseError::Cancelled);
            }
            report(gateway.purchase(&product))?;
        }
        PremiumAction::Restore => report(gateway.restore())?,
    }
    Ok(())
}

/// Cancellation is not an error worth showing.
fn report(outcome: Result<Entitlement, PurchaseError>) -> Result<(), Box<dyn Error>> {
    match outcome {
        Ok(entitlement) => print_json(&entitlement),
        Err(e) => match e.user_message() {
            Some(message) => Err(message.into()),
            None => {
                tracing::debug!("purchase cancelled");
                print_json(&json!({ "cancelled": true }))
            }
        },
    }
}
