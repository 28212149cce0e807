pub mod cart;

pub use cart::{
    cart_totals, AddItemRequest, Cart, CartItem, CartItemView, CartTotals, CartView,
    UpdateQuantityRequest,
};
