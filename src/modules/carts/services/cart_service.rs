use chrono::Utc;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::carts::models::{cart_totals, Cart, CartItem, CartView};
use crate::modules::carts::repositories::CartRepository;
use crate::modules::catalog::repositories::ProductRepository;

/// Cart operations for the requesting user.
///
/// Every mutation checks that the target line belongs to the caller's own
/// active cart; the check is part of the contract, not the UI's job.
pub struct CartService {
    cart_repo: CartRepository,
    product_repo: ProductRepository,
}

impl CartService {
    pub fn new(cart_repo: CartRepository, product_repo: ProductRepository) -> Self {
        Self {
            cart_repo,
            product_repo,
        }
    }

    /// The user's active cart with items and totals, created on first touch
    pub async fn get_cart(&self, user_id: &str) -> Result<CartView> {
        let cart = self.cart_repo.get_or_create_active(user_id).await?;
        self.build_view(cart).await
    }

    /// Add a product to the active cart.
    ///
    /// An existing line for the product is incremented; a new line snapshots
    /// the current effective price. Prescription-only products cannot be
    /// added directly, they enter the cart through an approved request.
    pub async fn add_item(&self, user_id: &str, product_id: &str, quantity: u32) -> Result<CartView> {
        if quantity == 0 {
            return Err(AppError::validation("Quantity must be at least 1"));
        }

        let product = self
            .product_repo
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product '{}' not found", product_id)))?;

        if !product.is_active {
            return Err(AppError::validation(format!(
                "Product '{}' is not available",
                product.name
            )));
        }

        if product.prescription_required {
            return Err(AppError::forbidden(format!(
                "'{}' requires an approved prescription",
                product.name
            )));
        }

        let cart = self.cart_repo.get_or_create_active(user_id).await?;

        let item = CartItem {
            id: Uuid::new_v4().to_string(),
            cart_id: cart.id.clone(),
            product_id: product.id.clone(),
            quantity,
            unit_price: product.effective_price(),
            prescription_request_id: None,
            added_at: Utc::now(),
        };

        self.cart_repo.insert_or_increment_item(&item).await?;

        tracing::debug!(
            user_id = %user_id,
            product_id = %product.id,
            quantity = quantity,
            "Cart item added"
        );

        self.build_view(cart).await
    }

    /// Set a line's quantity; zero removes the line
    pub async fn update_quantity(
        &self,
        user_id: &str,
        item_id: &str,
        quantity: u32,
    ) -> Result<CartView> {
        let (item, owner_id, cart_active) = self
            .cart_repo
            .find_item_with_owner(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Cart item '{}' not found", item_id)))?;

        if owner_id != user_id || !cart_active {
            return Err(AppError::forbidden(
                "Cart item does not belong to your active cart",
            ));
        }

        if quantity == 0 {
            self.cart_repo.delete_item(&item.id).await?;
        } else {
            self.cart_repo.update_item_quantity(&item.id, quantity).await?;
        }

        let cart = self.cart_repo.get_or_create_active(user_id).await?;
        self.build_view(cart).await
    }

    pub async fn remove_item(&self, user_id: &str, item_id: &str) -> Result<CartView> {
        let (item, owner_id, cart_active) = self
            .cart_repo
            .find_item_with_owner(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Cart item '{}' not found", item_id)))?;

        if owner_id != user_id || !cart_active {
            return Err(AppError::forbidden(
                "Cart item does not belong to your active cart",
            ));
        }

        self.cart_repo.delete_item(&item.id).await?;

        let cart = self.cart_repo.get_or_create_active(user_id).await?;
        self.build_view(cart).await
    }

    async fn build_view(&self, cart: Cart) -> Result<CartView> {
        let items = self.cart_repo.items_with_products(&cart.id).await?;
        let totals = cart_totals(&items);

        Ok(CartView {
            id: cart.id,
            items,
            totals,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        })
    }
}
