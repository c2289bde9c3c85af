pub mod gpout;
