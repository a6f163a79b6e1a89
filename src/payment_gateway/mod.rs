pub mod auth;
pub mod callback;
pub mod merchant_portal;
pub mod mpesa_payment_gateway;
pub mod stk_push;
