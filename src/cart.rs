//! Shopper cart persisted in client-held storage.
//!
//! The cart lives in the visitor's cookie session under [`CART_STORAGE_KEY`]
//! as a JSON array of compact product snapshots with a `quantity` field. The
//! session is a signed cookie, so the document is kept under
//! [`MAX_CART_BYTES`] and at most [`MAX_CART_LINES`] lines. Reads never fail:
//! missing or unreadable data is treated as an empty cart. Every mutation is
//! pushed to the store's subscribers.

use std::sync::{Arc, Mutex};

use actix_session::Session;
use thiserror::Error;

use crate::domain::cart::{Cart, CartItem, MAX_LINE_QUANTITY};
use crate::domain::product::Product;
use crate::repository::feed::{ChangeFeed, Subscription};

/// Storage key of the serialized cart.
pub const CART_STORAGE_KEY: &str = "fragranceCart";

/// Most distinct products a cart may hold.
pub const MAX_CART_LINES: usize = 10;

/// Budget for the stored document, measured as a JSON string value the way it
/// is embedded in the session state.
pub const MAX_CART_BYTES: usize = 2048;

/// Reasons a cart change was refused; the cart is left as it was.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartLimitError {
    #[error("Your cart can hold at most {MAX_CART_LINES} different fragrances.")]
    TooManyLines,
    #[error("You can order at most {MAX_LINE_QUANTITY} of one fragrance.")]
    QuantityLimit,
    #[error("Your cart is full. Remove an item to add another.")]
    TooLarge,
}

/// Errors raised by a [`CartStorage`] backend.
#[derive(Debug, Error)]
pub enum CartStorageError {
    #[error("failed to read the cart: {0}")]
    Read(String),
    #[error("failed to write the cart: {0}")]
    Write(String),
}

/// Raw key-value persistence used by [`CartStore`].
pub trait CartStorage {
    /// Return the stored JSON document, or `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<String>, CartStorageError>;
    fn save(&self, raw: &str) -> Result<(), CartStorageError>;
    fn clear(&self) -> Result<(), CartStorageError>;
}

/// Cart storage backed by the visitor's cookie session.
#[derive(Clone)]
pub struct SessionCartStorage {
    session: Session,
}

impl SessionCartStorage {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl CartStorage for SessionCartStorage {
    fn load(&self) -> Result<Option<String>, CartStorageError> {
        self.session
            .get::<String>(CART_STORAGE_KEY)
            .map_err(|err| CartStorageError::Read(err.to_string()))
    }

    fn save(&self, raw: &str) -> Result<(), CartStorageError> {
        self.session
            .insert(CART_STORAGE_KEY, raw)
            .map_err(|err| CartStorageError::Write(err.to_string()))
    }

    fn clear(&self) -> Result<(), CartStorageError> {
        self.session.remove(CART_STORAGE_KEY);
        Ok(())
    }
}

/// In-process cart storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryCartStorage {
    raw: Arc<Mutex<Option<String>>>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already serialized document, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// The document currently stored.
    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|raw| raw.clone())
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<String>, CartStorageError> {
        self.raw
            .lock()
            .map(|raw| raw.clone())
            .map_err(|err| CartStorageError::Read(err.to_string()))
    }

    fn save(&self, raw: &str) -> Result<(), CartStorageError> {
        let mut stored = self
            .raw
            .lock()
            .map_err(|err| CartStorageError::Write(err.to_string()))?;
        *stored = Some(raw.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), CartStorageError> {
        let mut stored = self
            .raw
            .lock()
            .map_err(|err| CartStorageError::Write(err.to_string()))?;
        *stored = None;
        Ok(())
    }
}

/// Observable cart with a single owner.
pub struct CartStore<S> {
    storage: S,
    feed: Arc<ChangeFeed<CartItem>>,
}

impl<S: CartStorage> CartStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            feed: ChangeFeed::new(),
        }
    }

    /// Current cart contents.
    pub fn read(&self) -> Cart {
        let raw = match self.storage.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::default(),
            Err(err) => {
                log::warn!("{err}; starting from an empty cart");
                return Cart::default();
            }
        };

        match serde_json::from_str::<Vec<CartItem>>(&raw) {
            Ok(items) => Cart::new(items.into_iter().map(CartItem::normalize).collect()),
            Err(err) => {
                log::warn!("Discarding unreadable cart: {err}");
                Cart::default()
            }
        }
    }

    /// Add one unit of `product`, creating its line on first add.
    ///
    /// A refused add is logged and the unchanged cart is returned; use
    /// [`CartStore::try_add`] to learn why.
    pub fn add(&self, product: &Product) -> Cart {
        self.try_add(product).unwrap_or_else(|err| {
            log::warn!("Product {} not added to cart: {err}", product.id);
            self.read()
        })
    }

    /// Add one unit of `product` unless a cart limit would be exceeded.
    pub fn try_add(&self, product: &Product) -> Result<Cart, CartLimitError> {
        let mut cart = self.read();

        match cart.items.iter().position(|item| item.id == product.id) {
            Some(index) if cart.items[index].quantity >= MAX_LINE_QUANTITY => {
                return Err(CartLimitError::QuantityLimit);
            }
            Some(index) => cart.items[index].quantity += 1,
            None if cart.items.len() >= MAX_CART_LINES => {
                return Err(CartLimitError::TooManyLines);
            }
            None => cart.items.push(CartItem::from_product(product)),
        }

        self.commit(cart)
    }

    /// Drop the line for `product_id`, keeping the other lines in order.
    pub fn remove(&self, product_id: i32) -> Cart {
        let mut cart = self.read();
        cart.items.retain(|item| item.id != product_id);
        self.commit_or_keep(cart)
    }

    /// Overwrite the quantity of an existing line, capped at
    /// [`MAX_LINE_QUANTITY`].
    ///
    /// Quantities below 1 leave the cart untouched; use [`CartStore::remove`]
    /// to delete a line.
    pub fn set_quantity(&self, product_id: i32, quantity: i32) -> Cart {
        let mut cart = self.read();
        if quantity < 1 {
            return cart;
        }

        match cart.items.iter_mut().find(|item| item.id == product_id) {
            Some(item) => item.quantity = quantity.min(MAX_LINE_QUANTITY),
            None => return cart,
        }

        self.commit_or_keep(cart)
    }

    /// Empty the cart, typically after a successful checkout.
    pub fn clear(&self) {
        if let Err(err) = self.storage.clear() {
            log::error!("{err}");
        }
        self.feed.publish(&[]);
    }

    /// Receive the cart lines after every change until the guard is dropped.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&[CartItem]) + Send + Sync + 'static,
    {
        self.feed.register(on_change)
    }

    fn commit_or_keep(&self, cart: Cart) -> Cart {
        self.commit(cart).unwrap_or_else(|err| {
            log::warn!("Cart change dropped: {err}");
            self.read()
        })
    }

    /// Persist `cart` and notify subscribers.
    ///
    /// Storage failures are logged and swallowed; only a document over
    /// [`MAX_CART_BYTES`] is refused, before anything is written.
    fn commit(&self, cart: Cart) -> Result<Cart, CartLimitError> {
        match serde_json::to_string(&cart.items) {
            Ok(raw) => {
                if stored_size(&raw) > MAX_CART_BYTES {
                    return Err(CartLimitError::TooLarge);
                }
                if let Err(err) = self.storage.save(&raw) {
                    log::error!("{err}");
                }
            }
            Err(err) => log::error!("Failed to serialize the cart: {err}"),
        }

        self.feed.publish(&cart.items);
        Ok(cart)
    }
}

/// Size of `raw` once quoted and escaped as a JSON string.
fn stored_size(raw: &str) -> usize {
    serde_json::to_string(raw)
        .map(|quoted| quoted.len())
        .unwrap_or(usize::MAX)
}
