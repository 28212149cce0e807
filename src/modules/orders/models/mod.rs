pub mod order;
pub mod order_item;

pub use order::{
    generate_order_number, generate_tran_id, Order, OrderStatus, OrderView, PaymentMethod,
    PlaceOrderRequest, PlaceOrderResponse, ShippingInfo, UpdateOrderStatusRequest,
};
pub use order_item::{order_total, OrderItem};
