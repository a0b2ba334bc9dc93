use std::thread;
use std::time::Duration;
use vr_bridge_api::{VREvent, VRError, VRFrameData, VRResult, VRService, VRServiceCreator};

#[cfg(feature = "openxr")]
use crate::api::OpenXrServiceCreator;

#[cfg(feature = "mock")]
use crate::api::MockServiceCreator;

/// How long to keep retrying services whose runtime has not finished
/// detecting the hardware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> RetryPolicy {
        RetryPolicy {
            attempts: 10,
            delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn once() -> RetryPolicy {
        RetryPolicy {
            attempts: 1,
            delay: Duration::from_millis(0),
        }
    }
}

struct ServiceEntry {
    service: Box<dyn VRService>,
    initialized: bool,
}

// Single entry point for all the VRServices
pub struct VRServiceManager {
    initialized: bool,
    services: Vec<ServiceEntry>,
}

impl Drop for VRServiceManager {
    fn drop(&mut self) {
        self.shutdown();
        self.services.clear();
    }
}

impl Default for VRServiceManager {
    fn default() -> VRServiceManager {
        VRServiceManager::new()
    }
}

impl VRServiceManager {
    pub fn new() -> VRServiceManager {
        VRServiceManager {
            initialized: false,
            services: Vec::new(),
        }
    }

    // Register the runtime backed services enabled in the crate's features
    pub fn register_defaults(&mut self) {
        let creators: Vec<Box<dyn VRServiceCreator>> = vec![
            #[cfg(feature = "openxr")]
            OpenXrServiceCreator::new(),
        ];

        for creator in &creators {
            self.register(creator.new_service());
        }
    }

    // Register mock VR Service
    // Useful for testing and dry runs without a headset
    #[cfg(feature = "mock")]
    pub fn register_mock(&mut self) {
        let creator = MockServiceCreator::new();
        self.register(creator.new_service());
    }

    // Register a new VR service
    pub fn register(&mut self, service: Box<dyn VRService>) {
        self.services.push(ServiceEntry {
            service,
            initialized: false,
        });
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    // Initializes all the services, a single attempt each
    pub fn initialize_services(&mut self) {
        if self.initialized {
            return;
        }

        for entry in &mut self.services {
            if entry.initialized {
                continue;
            }
            match entry.service.initialize() {
                Ok(()) => entry.initialized = true,
                Err(e) => error!("Error initializing VRService: {}", e),
            }
        }
        self.initialized = true;
    }

    /// Initializes every service, retrying the ones that failed with a
    /// retryable error. Succeeds as soon as one service is usable after a
    /// full round; otherwise returns the last error seen.
    pub fn initialize_with_retry(&mut self, policy: RetryPolicy) -> VRResult<()> {
        if self.services.is_empty() {
            return Err(VRError::Unavailable("no VR service registered".into()));
        }

        let attempts = policy.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let mut retryable = false;
            for entry in &mut self.services {
                if entry.initialized {
                    continue;
                }
                match entry.service.initialize() {
                    Ok(()) => entry.initialized = true,
                    Err(e) => {
                        warn!("VRService initialization attempt {}/{} failed: {}", attempt, attempts, e);
                        entry.service.shutdown();
                        retryable |= e.is_retryable();
                        last_error = Some(e);
                    }
                }
            }

            if self.active_index().is_some() {
                self.initialized = true;
                return Ok(());
            }
            if !retryable {
                break;
            }
            if attempt < attempts {
                info!("Retrying in {:?}, waiting for the runtime to detect the hardware", policy.delay);
                thread::sleep(policy.delay);
            }
        }

        Err(last_error.unwrap_or(VRError::NotInitialized))
    }

    /// Samples the first initialized and available service.
    pub fn sync(&mut self) -> VRResult<VRFrameData> {
        match self.active_index() {
            Some(index) => self.services[index].service.sync(),
            None => Err(VRError::NotInitialized),
        }
    }

    pub fn poll_events(&mut self) -> Vec<VREvent> {
        let mut events = Vec::new();
        for entry in &mut self.services {
            events.append(&mut entry.service.poll_events());
        }
        events
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn shutdown(&mut self) {
        for entry in &mut self.services {
            if entry.initialized {
                entry.service.shutdown();
                entry.initialized = false;
            }
        }
        self.initialized = false;
    }
}

impl VRServiceManager {
    fn active_index(&self) -> Option<usize> {
        self.services
            .iter()
            .position(|entry| entry.initialized && entry.service.is_available())
    }
}
