pub mod amount;
pub mod change;
pub mod csv;
pub mod engine;
pub mod inventory;
pub mod model;

pub use amount::Amount;
pub use change::make_change;
pub use engine::{Engine, Outcome};
pub use inventory::Inventory;
pub use model::{Catalog, Coin, Command, Dispensed, Product};
