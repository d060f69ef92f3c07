// Module exports for pure logic
pub mod breadcrumbs;         // Serializable trail snapshot
pub mod compare;             // Cross-field validation rule
pub mod events;              // History change subscriptions
pub mod navigation;          // Host navigator contract
