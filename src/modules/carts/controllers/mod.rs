pub mod cart_controller;
