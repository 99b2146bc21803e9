pub mod schemes;
