//! Parameter types for Odoo MCP tools
//!
//! Organized by domain: generic (model access), sales, purchase,
//! inventory, accounting, product_cost

mod accounting;
mod generic;
mod inventory;
mod product_cost;
mod purchase;
mod sales;

pub use accounting::*;
pub use generic::*;
pub use inventory::*;
pub use product_cost::*;
pub use purchase::*;
pub use sales::*;
