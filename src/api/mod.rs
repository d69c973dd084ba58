pub mod portfoliohut;
