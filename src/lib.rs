pub mod common {
    pub mod utils;
}
