mod network_integration;
mod packet;
mod registry;
mod scenario;
mod simulator;
