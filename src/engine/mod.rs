//! Purchase transaction engine.
//!
//! The engine owns the coin and product stock and runs one purchase at a time:
//! select a product, insert coins, then either collect the product with change
//! or refund the balance. Failed operations leave the engine untouched.
//! Also supports async stream of commands.

use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::change::make_change;
use crate::model::{Coin, Command, Dispensed, Product};
use crate::{Amount, Inventory};

mod state;
pub use state::MachineState;

mod error;
pub use error::{ChangeError, CollectError, EngineError, SelectError};

/// Units of every coin and product a new engine is stocked with.
pub const DEFAULT_STOCK: u32 = 5;

/// Successful result of [`Engine::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Product selected, with its price.
    Priced(Amount),
    /// Coin accepted, with the balance after it.
    Accepted(Amount),
    /// Product handed out with change.
    Dispensed(Dispensed),
    /// Balance returned as coins.
    Refunded(Vec<Coin>),
    Reset,
}

/// The vending transaction engine.
///
/// Not safe for concurrent use; a host sharing it across threads wraps it in a
/// mutex.
#[derive(Debug, Clone)]
pub struct Engine {
    coins: Inventory<Coin>,
    products: Inventory<Product>,
    total_sales: Amount,
    state: MachineState,
    /// Sum of coins inserted since the last transaction boundary
    balance: Amount,
}

/// Public API
impl Engine {
    /// Engine stocked with [`DEFAULT_STOCK`] of every coin and product.
    pub fn new() -> Self {
        Self::with_stock(DEFAULT_STOCK, DEFAULT_STOCK)
    }

    /// Engine stocked with `coins` of every coin and `products` of every product.
    pub fn with_stock(coins: u32, products: u32) -> Self {
        Self {
            coins: Inventory::stocked(coins),
            products: Inventory::stocked(products),
            total_sales: Amount::ZERO,
            state: MachineState::Idle,
            balance: Amount::ZERO,
        }
    }

    /// Run the engine with the given command stream
    pub async fn run(&mut self, mut stream: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = stream.next().await {
            // a failed command must not stop the machine; it is already logged
            let _ = self.apply(command);
        }
    }

    /// Apply a single command on top of the current engine state
    pub fn apply(&mut self, command: Command) -> Result<Outcome, EngineError> {
        let result = match command {
            Command::Select(product) => self
                .select_item(product)
                .map(Outcome::Priced)
                .map_err(EngineError::from),
            Command::Insert(coin) => {
                self.insert_coin(coin);
                Ok(Outcome::Accepted(self.balance))
            }
            Command::Collect => self
                .collect_item_and_change()
                .map(Outcome::Dispensed)
                .map_err(EngineError::from),
            Command::Refund => self
                .refund()
                .map(Outcome::Refunded)
                .map_err(EngineError::from),
            Command::Reset => {
                self.reset();
                Ok(Outcome::Reset)
            }
        };
        Self::log_result(command, &result);
        result
    }

    /// Select `product` and return its price.
    ///
    /// Selecting again while a product is already selected replaces it; the
    /// balance carries over to the new product.
    pub fn select_item(&mut self, product: Product) -> Result<Amount, SelectError> {
        if !self.products.has(product) {
            return Err(SelectError::SoldOut(product));
        }

        if let Some(previous) = self.state.product() {
            if previous != product && !self.balance.is_zero() {
                warn!(
                    previous = %previous,
                    product = %product,
                    balance = %self.balance,
                    "selection replaced while holding a balance"
                );
            }
        }

        self.state = MachineState::Selected(product);
        Ok(product.price())
    }

    /// Deposit a coin. It is immediately available as change.
    pub fn insert_coin(&mut self, coin: Coin) {
        self.balance += coin.denomination();
        self.coins.add(coin);
    }

    /// Hand out the selected product and the change owed:
    /// - Ensure a product is selected
    /// - Ensure the balance covers the price
    /// - Ensure the change can be formed from the coin stock
    /// - Deduct product and change coins, book the sale, end the transaction
    pub fn collect_item_and_change(&mut self) -> Result<Dispensed, CollectError> {
        let product = self.state.product().ok_or(CollectError::NoSelection)?;
        let price = product.price();

        let change_due =
            self.balance
                .checked_sub(price)
                .ok_or_else(|| CollectError::NotFullPaid {
                    product,
                    remaining: price - self.balance,
                })?;

        // make_change works on a copy, so nothing has changed if this fails
        let change = make_change(change_due, &self.coins)?;

        self.products.deduct(product);
        self.total_sales += price;
        self.hand_out(&change);
        self.end_transaction();

        Ok(Dispensed::new(product, change))
    }

    /// Abort the transaction and return the balance as coins.
    ///
    /// The balance is decomposed again from the coin stock rather than
    /// returning the inserted coins, so this can fail on a drained machine.
    pub fn refund(&mut self) -> Result<Vec<Coin>, ChangeError> {
        let refund = make_change(self.balance, &self.coins)?;
        self.hand_out(&refund);
        self.end_transaction();
        Ok(refund)
    }

    /// Empty all stock and zero sales. Does not restock.
    pub fn reset(&mut self) {
        self.coins.clear();
        self.products.clear();
        self.total_sales = Amount::ZERO;
        self.end_transaction();
    }

    /// Accumulated price of every collected product.
    pub fn total_sales(&self) -> Amount {
        self.total_sales
    }

    pub fn coin_inventory(&self) -> &Inventory<Coin> {
        &self.coins
    }

    pub fn product_inventory(&self) -> &Inventory<Product> {
        &self.products
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn current_product(&self) -> Option<Product> {
        self.state.product()
    }

    pub fn current_balance(&self) -> Amount {
        self.balance
    }
}

/// Private API
impl Engine {
    /// Small helper to log `apply` results
    fn log_result(command: Command, result: &Result<Outcome, EngineError>) {
        let kind = command.kind();
        match result {
            Ok(Outcome::Priced(price)) => {
                info!(command = ?command, price = %price, "{kind} applied");
            }
            Ok(Outcome::Accepted(balance)) => {
                info!(command = ?command, balance = %balance, "{kind} applied");
            }
            Ok(Outcome::Dispensed(dispensed)) => {
                info!(
                    product = %dispensed.product(),
                    change = %dispensed.change_total(),
                    coins = dispensed.change().len(),
                    "{kind} applied"
                );
            }
            Ok(Outcome::Refunded(coins)) => {
                let amount: Amount = coins.iter().map(|coin| coin.denomination()).sum();
                info!(refund = %amount, coins = coins.len(), "{kind} applied");
            }
            Ok(Outcome::Reset) => {
                info!("{kind} applied");
            }
            Err(e) => {
                info!(command = ?command, reason = %e, "{kind} skipped");
            }
        }
    }

    /// Remove handed-out coins from the stock
    fn hand_out(&mut self, coins: &[Coin]) {
        for coin in coins {
            self.coins.deduct(*coin);
        }
    }

    /// Return to a transaction boundary
    fn end_transaction(&mut self) {
        self.balance = Amount::ZERO;
        self.state = MachineState::Idle;
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // test utils

    fn coin_total(coins: &[Coin]) -> Amount {
        coins.iter().map(|coin| coin.denomination()).sum()
    }

    fn buy(
        engine: &mut Engine,
        product: Product,
        coins: &[Coin],
    ) -> Result<Dispensed, CollectError> {
        engine.select_item(product).unwrap();
        for coin in coins {
            engine.insert_coin(*coin);
        }
        engine.collect_item_and_change()
    }

    #[test]
    fn new_engine() {
        let engine = Engine::new();
        assert_eq!(engine.total_sales(), Amount::ZERO);
        assert_eq!(engine.state(), MachineState::Idle);
        assert_eq!(engine.current_balance(), Amount::ZERO);
        assert_eq!(engine.coin_inventory().count(Coin::Quarter), DEFAULT_STOCK);
        assert_eq!(engine.product_inventory().count(Product::Soda), DEFAULT_STOCK);
    }

    // Select

    #[test]
    fn select_returns_price_and_selects() {
        let mut engine = Engine::new();
        assert_eq!(engine.select_item(Product::Pepsi), Ok(Amount::from_cents(35)));
        assert_eq!(engine.state(), MachineState::Selected(Product::Pepsi));
    }

    #[test]
    fn select_sold_out_fails_and_stays_idle() {
        let mut engine = Engine::with_stock(5, 0);
        assert_eq!(
            engine.select_item(Product::Coke),
            Err(SelectError::SoldOut(Product::Coke))
        );
        assert_eq!(engine.state(), MachineState::Idle);
    }

    #[test]
    fn select_sold_out_while_selected_keeps_previous_selection() {
        let mut engine = Engine::new();
        engine.products.put(Product::Coke, 0);
        engine.select_item(Product::Pepsi).unwrap();
        engine.insert_coin(Coin::Quarter);

        assert_eq!(
            engine.select_item(Product::Coke),
            Err(SelectError::SoldOut(Product::Coke))
        );
        assert_eq!(engine.state(), MachineState::Selected(Product::Pepsi));
        assert_eq!(engine.current_balance(), Amount::from_cents(25));
    }

    #[test]
    fn reselect_replaces_product_and_keeps_balance() {
        let mut engine = Engine::new();
        engine.select_item(Product::Soda).unwrap();
        engine.insert_coin(Coin::Quarter);
        engine.select_item(Product::Coke).unwrap();

        assert_eq!(engine.current_product(), Some(Product::Coke));
        assert_eq!(engine.current_balance(), Amount::from_cents(25));

        let dispensed = engine.collect_item_and_change().unwrap();
        assert_eq!(dispensed.product(), Product::Coke);
        assert!(dispensed.change().is_empty());
    }

    // Insert

    #[test]
    fn insert_adds_balance_and_stock() {
        let mut engine = Engine::new();
        engine.insert_coin(Coin::Dime);
        engine.insert_coin(Coin::Penny);
        assert_eq!(engine.current_balance(), Amount::from_cents(11));
        assert_eq!(engine.coin_inventory().count(Coin::Dime), 6);
        assert_eq!(engine.coin_inventory().count(Coin::Penny), 6);
        // inserting does not select anything
        assert_eq!(engine.state(), MachineState::Idle);
    }

    // Collect

    #[test]
    fn collect_exact_price() {
        let mut engine = Engine::new();
        let dispensed = buy(&mut engine, Product::Coke, &[Coin::Quarter]).unwrap();

        assert_eq!(dispensed.into_parts(), (Product::Coke, vec![]));
        assert_eq!(engine.total_sales(), Amount::from_cents(25));
        assert_eq!(engine.product_inventory().count(Product::Coke), 4);
        assert_eq!(engine.coin_inventory().count(Coin::Quarter), 6);
        assert_eq!(engine.state(), MachineState::Idle);
        assert_eq!(engine.current_balance(), Amount::ZERO);
    }

    #[test]
    fn collect_overpaid_returns_change() {
        let mut engine = Engine::new();
        let dispensed = buy(&mut engine, Product::Soda, &[Coin::Quarter, Coin::Quarter]).unwrap();

        assert_eq!(dispensed.product(), Product::Soda);
        assert_eq!(dispensed.change(), &[Coin::Nickel]);
        assert_eq!(engine.coin_inventory().count(Coin::Nickel), 4);
        assert_eq!(engine.coin_inventory().count(Coin::Quarter), 7);
        assert_eq!(engine.total_sales(), Amount::from_cents(45));
    }

    #[test]
    fn collect_without_selection_fails() {
        let mut engine = Engine::new();
        engine.insert_coin(Coin::Quarter);
        assert_eq!(
            engine.collect_item_and_change(),
            Err(CollectError::NoSelection)
        );
        assert_eq!(engine.current_balance(), Amount::from_cents(25));
    }

    #[test]
    fn collect_underpaid_reports_remaining_and_keeps_state() {
        let mut engine = Engine::new();
        let result = buy(&mut engine, Product::Pepsi, &[Coin::Quarter]);
        assert_eq!(
            result,
            Err(CollectError::NotFullPaid {
                product: Product::Pepsi,
                remaining: Amount::from_cents(10),
            })
        );

        // unchanged: customer can top up and retry
        assert_eq!(engine.state(), MachineState::Selected(Product::Pepsi));
        assert_eq!(engine.current_balance(), Amount::from_cents(25));
        assert_eq!(engine.total_sales(), Amount::ZERO);
        assert_eq!(engine.product_inventory().count(Product::Pepsi), 5);

        engine.insert_coin(Coin::Dime);
        let dispensed = engine.collect_item_and_change().unwrap();
        assert_eq!(dispensed.product(), Product::Pepsi);
        assert!(dispensed.change().is_empty());
    }

    #[test]
    fn collect_insufficient_change_keeps_state() {
        let mut engine = Engine::with_stock(0, 5);
        engine.select_item(Product::Pepsi).unwrap();
        engine.insert_coin(Coin::Quarter);
        engine.insert_coin(Coin::Quarter);
        let coins_before = engine.coin_inventory().clone();

        assert_eq!(
            engine.collect_item_and_change(),
            Err(CollectError::InsufficientChange(ChangeError {
                amount: Amount::from_cents(15)
            }))
        );

        assert_eq!(engine.coin_inventory(), &coins_before);
        assert_eq!(engine.state(), MachineState::Selected(Product::Pepsi));
        assert_eq!(engine.current_balance(), Amount::from_cents(50));
        assert_eq!(engine.product_inventory().count(Product::Pepsi), 5);
        assert_eq!(engine.total_sales(), Amount::ZERO);

        // the inserted coins can still be refunded
        let refund = engine.refund().unwrap();
        assert_eq!(refund, vec![Coin::Quarter, Coin::Quarter]);
        assert!(engine.coin_inventory().is_empty());
    }

    #[test]
    fn inserted_coin_is_eligible_as_its_own_change() {
        // no quarters in stock, but the customer's quarter can be returned
        let mut engine = Engine::with_stock(0, 5);

        engine.select_item(Product::Coke).unwrap();
        engine.insert_coin(Coin::Quarter);
        engine.insert_coin(Coin::Quarter);
        let dispensed = engine.collect_item_and_change().unwrap();
        assert_eq!(dispensed.change(), &[Coin::Quarter]);
        assert_eq!(engine.coin_inventory().count(Coin::Quarter), 1);
    }

    // Refund

    #[test]
    fn refund_returns_balance() {
        let mut engine = Engine::new();
        engine.select_item(Product::Pepsi).unwrap();
        for coin in [Coin::Dime, Coin::Quarter, Coin::Penny, Coin::Nickel] {
            engine.insert_coin(coin);
        }

        let refund = engine.refund().unwrap();
        assert_eq!(coin_total(&refund), Amount::from_cents(41));
        assert_eq!(engine.state(), MachineState::Idle);
        assert_eq!(engine.current_balance(), Amount::ZERO);
        assert_eq!(engine.coin_inventory().total(), Amount::from_cents(5 * 41));
    }

    #[test]
    fn refund_with_zero_balance_is_empty() {
        let mut engine = Engine::new();
        engine.select_item(Product::Coke).unwrap();
        assert_eq!(engine.refund(), Ok(vec![]));
        assert_eq!(engine.state(), MachineState::Idle);
    }

    #[test]
    fn refund_that_cannot_be_formed_fails_unchanged() {
        // 30 cents in three dimes; greedy takes a stocked quarter first and is stuck
        let mut engine = Engine::with_stock(0, 5);
        engine.coins.put(Coin::Quarter, 1);
        engine.select_item(Product::Pepsi).unwrap();
        for _ in 0..3 {
            engine.insert_coin(Coin::Dime);
        }

        assert_eq!(
            engine.refund(),
            Err(ChangeError {
                amount: Amount::from_cents(30)
            })
        );
        assert_eq!(engine.current_balance(), Amount::from_cents(30));
        assert_eq!(engine.coin_inventory().count(Coin::Dime), 3);
        assert_eq!(engine.state(), MachineState::Selected(Product::Pepsi));
    }

    // Reset

    #[test]
    fn reset_empties_everything() {
        let mut engine = Engine::new();
        buy(&mut engine, Product::Coke, &[Coin::Quarter]).unwrap();
        engine.select_item(Product::Soda).unwrap();
        engine.insert_coin(Coin::Dime);

        engine.reset();

        assert!(engine.coin_inventory().is_empty());
        assert!(engine.product_inventory().is_empty());
        assert_eq!(engine.total_sales(), Amount::ZERO);
        assert_eq!(engine.current_balance(), Amount::ZERO);
        assert_eq!(engine.state(), MachineState::Idle);
        assert_eq!(
            engine.select_item(Product::Coke),
            Err(SelectError::SoldOut(Product::Coke))
        );
    }

    // Scenarios

    #[test]
    fn sixth_coke_is_sold_out() {
        let mut engine = Engine::new();
        for _ in 0..5 {
            buy(&mut engine, Product::Coke, &[Coin::Quarter]).unwrap();
        }
        assert_eq!(
            engine.select_item(Product::Coke),
            Err(SelectError::SoldOut(Product::Coke))
        );
        assert_eq!(engine.total_sales(), Amount::from_cents(125));
    }

    #[test]
    fn small_coins_run_out() {
        let mut engine = Engine::new();
        let two_quarters = [Coin::Quarter, Coin::Quarter];

        let failure = (0..5)
            .flat_map(|_| [Product::Soda, Product::Pepsi])
            .find_map(|product| buy(&mut engine, product, &two_quarters).err());

        assert!(matches!(
            failure,
            Some(CollectError::InsufficientChange(_))
        ));
    }

    // apply()

    #[test]
    fn apply_maps_outcomes_and_errors() {
        let mut engine = Engine::new();
        assert_eq!(
            engine.apply(Command::Select(Product::Coke)),
            Ok(Outcome::Priced(Amount::from_cents(25)))
        );
        assert_eq!(
            engine.apply(Command::Collect),
            Err(EngineError::Collect(CollectError::NotFullPaid {
                product: Product::Coke,
                remaining: Amount::from_cents(25),
            }))
        );
        assert_eq!(
            engine.apply(Command::Insert(Coin::Quarter)),
            Ok(Outcome::Accepted(Amount::from_cents(25)))
        );
        assert_eq!(
            engine.apply(Command::Collect),
            Ok(Outcome::Dispensed(Dispensed::new(Product::Coke, vec![])))
        );
        assert_eq!(engine.apply(Command::Refund), Ok(Outcome::Refunded(vec![])));
        assert_eq!(engine.apply(Command::Reset), Ok(Outcome::Reset));
        assert_eq!(
            engine.apply(Command::Select(Product::Coke)),
            Err(EngineError::Select(SelectError::SoldOut(Product::Coke)))
        );
    }

    //  Async run()

    #[tokio::test]
    async fn run_processes_all_commands() {
        let mut engine = Engine::new();
        let commands = vec![
            Command::Select(Product::Soda),
            Command::Insert(Coin::Quarter),
            Command::Insert(Coin::Quarter),
            Command::Collect,
        ];

        engine.run(tokio_stream::iter(commands)).await;

        assert_eq!(engine.total_sales(), Amount::from_cents(45));
        assert_eq!(engine.product_inventory().count(Product::Soda), 4);
    }

    #[tokio::test]
    async fn run_skips_failed_commands_and_continues() {
        let mut engine = Engine::new();
        let commands = vec![
            Command::Select(Product::Pepsi),
            Command::Insert(Coin::Quarter),
            Command::Collect, // Should fail: 10 cents short
            Command::Insert(Coin::Dime),
            Command::Collect, // Should still process
        ];

        engine.run(tokio_stream::iter(commands)).await;

        assert_eq!(engine.total_sales(), Amount::from_cents(35));
        assert_eq!(engine.state(), MachineState::Idle);
    }
}
