//! Common utilities for tests: mock collaborators and a registry fixture.
#![allow(dead_code)]

use std::{
    fmt::Arguments,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use blkdev::{
    BlockCache, DeviceId, DiskCapabilities, DiskDevice, DiskIoctl, DiskRegistry, IoctlRequest,
    NameService,
    error::{CacheError, DriverError, NameError},
    sync::irq::NoInterrupts,
};
use log::LevelFilter;

pub const ORANGE: &str = "\x1b[38;5;214m";
pub const RESET: &str = "\x1b[0m";

/// Provides a macro for logging messages during tests.
/// e.g. log!("placeholder") -> println!("[test] placeholder");
#[macro_export]
macro_rules! log {
    ($msg:expr) => {
        println!("{}[test] {}{}", crate::common::ORANGE, $msg, crate::common::RESET)
    };
    ($msg:expr, $($arg:tt)*) => {
        println!("{}[test] {}{}", crate::common::ORANGE, format!($msg, $($arg)*), crate::common::RESET)
    };
}

fn print_sink(args: Arguments<'_>) {
    println!("{}", args);
}

pub fn init_logging() {
    // Every test binary calls this from several tests; only the first one installs the logger.
    let _ = blkdev::logging::init(print_sink, LevelFilter::Debug);
}

// region: Mock collaborators

/// Driver that answers capability queries and records deletion notices.
#[derive(Debug, Default)]
pub struct MockDriver {
    pub caps: Option<DiskCapabilities>,
    pub deleted: Mutex<Vec<DeviceId>>,
}

impl MockDriver {
    pub fn with_caps(caps: DiskCapabilities) -> Arc<MockDriver> {
        Arc::new(MockDriver {
            caps: Some(caps),
            deleted: Mutex::new(vec![]),
        })
    }

    pub fn deleted(&self) -> Vec<DeviceId> {
        self.deleted.lock().unwrap().clone()
    }
}

impl DiskIoctl for MockDriver {
    fn ioctl(&self, dd: &DiskDevice, request: IoctlRequest<'_>) -> Result<(), DriverError> {
        match request {
            IoctlRequest::Capabilities(out) => match self.caps {
                Some(caps) => {
                    *out = caps;
                    Ok(())
                }
                None => Err(DriverError::Io),
            },
            IoctlRequest::Deleted => {
                self.deleted.lock().unwrap().push(dd.id());
                Ok(())
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MockNames {
    pub registered: Mutex<Vec<(String, DeviceId)>>,
    pub unregistered: Mutex<Vec<String>>,
    pub refuse: Mutex<Vec<String>>,
}

impl MockNames {
    pub fn is_registered(&self, name: &str) -> bool {
        self.registered
            .lock()
            .unwrap()
            .iter()
            .any(|(registered, _)| registered == name)
    }

    pub fn refuse(&self, name: &str) {
        self.refuse.lock().unwrap().push(name.to_string());
    }
}

impl NameService for MockNames {
    fn register(&self, name: &str, id: DeviceId) -> Result<(), NameError> {
        if self.refuse.lock().unwrap().iter().any(|refused| refused == name) {
            return Err(NameError::Invalid);
        }
        let mut registered = self.registered.lock().unwrap();
        if registered.iter().any(|(registered, _)| registered == name) {
            return Err(NameError::Exists);
        }
        registered.push((name.to_string(), id));
        Ok(())
    }

    fn unregister(&self, name: &str) -> Result<(), NameError> {
        self.unregistered.lock().unwrap().push(name.to_string());
        let mut registered = self.registered.lock().unwrap();
        let before = registered.len();
        registered.retain(|(registered, _)| registered != name);
        if registered.len() == before {
            Err(NameError::NotFound)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Default)]
pub struct MockCache {
    pub fail: bool,
    pub inits: AtomicUsize,
}

impl MockCache {
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }
}

impl BlockCache for MockCache {
    fn init(&self) -> Result<(), CacheError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(CacheError::NoMemory)
        } else {
            Ok(())
        }
    }
}

// endregion

pub const BLOCK_SIZE: u32 = 512;

pub struct Fixture {
    pub disks: DiskRegistry,
    pub names: &'static MockNames,
    pub cache: &'static MockCache,
    pub driver: Arc<MockDriver>,
}

impl Fixture {
    /// An initialized registry over fresh mocks.
    pub fn new() -> Fixture {
        let fixture = Fixture::uninitialized(MockCache::default());
        fixture.disks.initialize().unwrap();
        fixture
    }

    pub fn uninitialized(cache: MockCache) -> Fixture {
        init_logging();
        let names: &'static MockNames = Box::leak(Box::new(MockNames::default()));
        let cache: &'static MockCache = Box::leak(Box::new(cache));
        Fixture {
            disks: DiskRegistry::new(names, cache, &NoInterrupts),
            names,
            cache,
            driver: MockDriver::with_caps(DiskCapabilities::SYNC),
        }
    }

    pub fn handler(&self) -> Option<Arc<dyn DiskIoctl>> {
        Some(self.driver.clone())
    }

    pub fn physical(&self, major: u32, minor: u32, block_count: u64) {
        self.disks
            .create_physical(
                DeviceId::new(major, minor),
                BLOCK_SIZE,
                block_count,
                self.handler(),
                None,
                None,
            )
            .unwrap();
    }

    pub fn logical(&self, id: (u32, u32), physical: (u32, u32), start: u64, count: u64) {
        self.disks
            .create_logical(
                DeviceId::new(id.0, id.1),
                DeviceId::new(physical.0, physical.1),
                start,
                count,
                None,
            )
            .unwrap();
    }

    /// Whether `id` can currently be obtained; gives the use straight back.
    pub fn is_live(&self, major: u32, minor: u32) -> bool {
        match self.disks.obtain(DeviceId::new(major, minor)) {
            Some(dd) => {
                self.disks.release(dd);
                true
            }
            None => false,
        }
    }

    /// Use count of a live device, not counting the probe itself.
    pub fn uses(&self, major: u32, minor: u32) -> u32 {
        let dd = self
            .disks
            .obtain(DeviceId::new(major, minor))
            .expect("device is not live");
        let uses = dd.use_count() - 1;
        self.disks.release(dd);
        uses
    }
}
