pub mod error;
pub mod net;
pub mod proto;
pub mod registry;
pub mod scenario;
pub mod sim;

#[cfg(test)]
mod test;
