mod macro_store;

pub use macro_store::MacroStore;
