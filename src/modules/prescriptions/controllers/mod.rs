pub mod prescription_controller;
