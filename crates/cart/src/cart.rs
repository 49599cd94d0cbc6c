use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rocketcart_core::{Aggregate, AggregateRoot, CartId, DomainError, Entity, ProductId};
use rocketcart_events::Event;

use crate::product::{LineItem, Product};

/// Aggregate root: Cart.
///
/// Ordered line items, one per product, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    id: CartId,
    items: Vec<LineItem>,
    version: u64,
}

impl Cart {
    /// Create an empty cart.
    pub fn empty(id: CartId) -> Self {
        Self {
            id,
            items: Vec::new(),
            version: 0,
        }
    }

    /// Rebuild a cart from persisted state.
    ///
    /// Rejects states that could never have been produced by `apply`
    /// (duplicate products, non-positive amounts).
    pub fn restore(id: CartId, items: Vec<LineItem>, version: u64) -> Result<Self, DomainError> {
        for (idx, item) in items.iter().enumerate() {
            if item.amount == 0 {
                return Err(DomainError::invariant(format!(
                    "line item for product {} has amount 0",
                    item.id
                )));
            }
            if items[..idx].iter().any(|other| other.id == item.id) {
                return Err(DomainError::invariant(format!(
                    "duplicate line item for product {}",
                    item.id
                )));
            }
        }

        Ok(Self { id, items, version })
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    pub fn get(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| *item.id() == product_id)
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    pub fn total_amount(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Decide and apply a command on a copy of this cart.
    ///
    /// Returns the resulting cart together with the events that produced it;
    /// `self` is left untouched so callers can commit the copy only once the
    /// change is durable.
    pub fn evolve(&self, command: &CartCommand) -> Result<(Cart, Vec<CartEvent>), DomainError> {
        let events = self.handle(command)?;
        let mut next = self.clone();
        for event in &events {
            next.apply(event);
        }
        Ok((next, events))
    }

    fn item_mut(&mut self, product_id: ProductId) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| *item.id() == product_id)
    }
}

impl AggregateRoot for Cart {
    type Id = CartId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddProduct.
///
/// `stock` is the maximum purchasable quantity reported for the product when
/// the command was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddProduct {
    pub product: Product,
    pub stock: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveProduct {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateProductAmount.
///
/// `amount` is signed because it comes straight from consumers; anything not
/// strictly positive is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    pub amount: i64,
    pub stock: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartCommand {
    AddProduct(AddProduct),
    RemoveProduct(RemoveProduct),
    UpdateProductAmount(UpdateProductAmount),
}

/// Event: ProductAdded (new line appended with amount 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAdded {
    pub item: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductIncremented (existing line bumped by one unit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductIncremented {
    pub product_id: ProductId,
    pub amount: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRemoved {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AmountUpdated (line set to an explicit amount).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountUpdated {
    pub product_id: ProductId,
    pub amount: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartEvent {
    ProductAdded(ProductAdded),
    ProductIncremented(ProductIncremented),
    ProductRemoved(ProductRemoved),
    AmountUpdated(AmountUpdated),
}

impl CartEvent {
    pub fn product_id(&self) -> ProductId {
        match self {
            CartEvent::ProductAdded(e) => e.item.id,
            CartEvent::ProductIncremented(e) => e.product_id,
            CartEvent::ProductRemoved(e) => e.product_id,
            CartEvent::AmountUpdated(e) => e.product_id,
        }
    }
}

impl Event for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::ProductAdded(_) => "cart.product_added",
            CartEvent::ProductIncremented(_) => "cart.product_incremented",
            CartEvent::ProductRemoved(_) => "cart.product_removed",
            CartEvent::AmountUpdated(_) => "cart.amount_updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CartEvent::ProductAdded(e) => e.occurred_at,
            CartEvent::ProductIncremented(e) => e.occurred_at,
            CartEvent::ProductRemoved(e) => e.occurred_at,
            CartEvent::AmountUpdated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Cart {
    type Command = CartCommand;
    type Event = CartEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CartEvent::ProductAdded(e) => match self.item_mut(e.item.id) {
                Some(existing) => *existing = e.item.clone(),
                None => self.items.push(e.item.clone()),
            },
            CartEvent::ProductIncremented(e) => {
                if let Some(item) = self.item_mut(e.product_id) {
                    item.amount = e.amount;
                }
            }
            CartEvent::ProductRemoved(e) => {
                self.items.retain(|item| item.id != e.product_id);
            }
            CartEvent::AmountUpdated(e) => {
                if let Some(item) = self.item_mut(e.product_id) {
                    item.amount = e.amount;
                }
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CartCommand::AddProduct(cmd) => self.handle_add(cmd),
            CartCommand::RemoveProduct(cmd) => self.handle_remove(cmd),
            CartCommand::UpdateProductAmount(cmd) => self.handle_update_amount(cmd),
        }
    }
}

impl Cart {
    fn handle_add(&self, cmd: &AddProduct) -> Result<Vec<CartEvent>, DomainError> {
        let product_id = cmd.product.id;

        if let Some(existing) = self.get(product_id) {
            // One more unit must still fit in the observed stock.
            let next = match existing.amount.checked_add(1) {
                Some(next) if next <= cmd.stock => next,
                _ => {
                    return Err(DomainError::stock_exhausted(
                        product_id,
                        i64::from(existing.amount) + 1,
                        cmd.stock,
                    ));
                }
            };

            return Ok(vec![CartEvent::ProductIncremented(ProductIncremented {
                product_id,
                amount: next,
                occurred_at: cmd.occurred_at,
            })]);
        }

        if cmd.stock < 1 {
            return Err(DomainError::stock_exhausted(product_id, 1, cmd.stock));
        }

        Ok(vec![CartEvent::ProductAdded(ProductAdded {
            item: LineItem::new(cmd.product.clone(), 1),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveProduct) -> Result<Vec<CartEvent>, DomainError> {
        if !self.contains(cmd.product_id) {
            return Err(DomainError::not_found(cmd.product_id));
        }

        Ok(vec![CartEvent::ProductRemoved(ProductRemoved {
            product_id: cmd.product_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_amount(
        &self,
        cmd: &UpdateProductAmount,
    ) -> Result<Vec<CartEvent>, DomainError> {
        if !self.contains(cmd.product_id) {
            return Err(DomainError::not_found(cmd.product_id));
        }

        if cmd.amount <= 0 {
            return Err(DomainError::InvalidAmount {
                product_id: cmd.product_id,
                amount: cmd.amount,
            });
        }

        let amount = match u32::try_from(cmd.amount) {
            Ok(amount) if amount <= cmd.stock => amount,
            _ => {
                return Err(DomainError::stock_exhausted(
                    cmd.product_id,
                    cmd.amount,
                    cmd.stock,
                ));
            }
        };

        Ok(vec![CartEvent::AmountUpdated(AmountUpdated {
            product_id: cmd.product_id,
            amount,
            occurred_at: cmd.occurred_at,
        })])
    }
}
