mod handle;
mod reader;
pub mod region;

// Mock memory reader for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use handle::ProcessHandle;
pub use reader::{MemoryReader, ReadMemory};
pub use region::{MemoryRegionInfo, MemoryRegionList, Permissions, RegionInventory};

// Re-export mock for convenient access in tests
#[doc(hidden)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};
