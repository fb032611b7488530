// Stratus Job Platform - Application Layer
//
// Hosts the resource-cluster scaler: the serialized control loop that keeps
// each SKU's idle buffer within its configured window.

pub mod scaler;

pub use scaler::*;
