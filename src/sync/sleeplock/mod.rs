mod sleeplock;

pub use sleeplock::{SleepLock, SleepLockGuard};
