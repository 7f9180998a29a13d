//! Name to driver binding.

use std::collections::HashMap;
use std::sync::Arc;

use asupersync::{Cx, Outcome};

use crate::connection::Driver;
use crate::error::{Error, Result};
use crate::try_outcome;
use crate::url::DatabaseUrl;

/// Connected drivers keyed by name, usually the database name.
///
/// Statements that are not given an explicit cursor look their driver up
/// here by the table's database name.
pub struct DriverRegistry<D: Driver> {
    drivers: HashMap<String, Arc<D>>,
}

impl<D: Driver> Default for DriverRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Driver> DriverRegistry<D> {
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Connect to `url` and register the driver under `name`, defaulting to
    /// the URL's database segment. A driver already registered under that
    /// name is disconnected and replaced.
    #[tracing::instrument(level = "debug", skip(self, cx, url))]
    pub async fn connect(
        &mut self,
        cx: &Cx,
        url: &str,
        name: Option<&str>,
    ) -> Outcome<Arc<D>, Error> {
        let url = match DatabaseUrl::parse(url).and_then(|u| {
            u.check_scheme(D::SCHEMES)?;
            Ok(u)
        }) {
            Ok(url) => url,
            Err(e) => return Outcome::Err(e),
        };
        let driver = match D::connect(cx, &url).await {
            Outcome::Ok(driver) => Arc::new(driver),
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };
        let name = name.map_or_else(|| url.database.clone(), str::to_string);
        tracing::info!(
            name = %name,
            host = %url.host,
            port = url.port_or(D::DEFAULT_PORT),
            database = %url.database,
            "Connected driver"
        );
        if let Some(previous) = self.drivers.insert(name.clone(), Arc::clone(&driver)) {
            tracing::info!(name = %name, "Disconnecting replaced driver");
            try_outcome!(previous.disconnect(cx).await);
        }
        Outcome::Ok(driver)
    }

    /// Register an already connected driver.
    pub fn insert(&mut self, name: impl Into<String>, driver: D) -> Arc<D> {
        let driver = Arc::new(driver);
        self.drivers.insert(name.into(), Arc::clone(&driver));
        driver
    }

    pub fn get(&self, name: &str) -> Result<&Arc<D>> {
        self.drivers.get(name).ok_or_else(|| Error::DriverNotRegistered {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Disconnect the driver registered under `name` and remove it.
    #[tracing::instrument(level = "debug", skip(self, cx))]
    pub async fn disconnect(&mut self, cx: &Cx, name: &str) -> Outcome<(), Error> {
        let Some(driver) = self.drivers.remove(name) else {
            return Outcome::Err(Error::DriverNotRegistered {
                name: name.to_string(),
            });
        };
        tracing::info!(name = %name, "Disconnecting driver");
        driver.disconnect(cx).await
    }

    /// Disconnect every driver; the first failure is returned after all
    /// drivers were attempted.
    pub async fn disconnect_all(&mut self, cx: &Cx) -> Outcome<(), Error> {
        let mut first_error = None;
        let mut names: Vec<String> = self.drivers.keys().cloned().collect();
        names.sort();
        for name in names {
            match self.disconnect(cx, &name).await {
                Outcome::Ok(()) => {}
                Outcome::Err(e) => {
                    tracing::warn!(name = %name, error = %e, "Driver disconnect failed");
                    first_error.get_or_insert(e);
                }
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
        }
        match first_error {
            Some(e) => Outcome::Err(e),
            None => Outcome::Ok(()),
        }
    }
}

impl<D: Driver> std::fmt::Debug for DriverRegistry<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryDriver;
    use asupersync::runtime::RuntimeBuilder;

    #[test]
    fn test_connect_defaults_name_to_database() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        let mut drivers = DriverRegistry::<MemoryDriver>::new();

        rt.block_on(async {
            let outcome = drivers.connect(&cx, "memory://localhost/sample", None).await;
            assert!(matches!(outcome, Outcome::Ok(_)));
            let outcome = drivers
                .connect(&cx, "memory:///other", Some("secondary"))
                .await;
            assert!(matches!(outcome, Outcome::Ok(_)));
        });
        assert_eq!(drivers.names(), ["sample", "secondary"]);
        assert_eq!(drivers.get("sample").unwrap().database(), "sample");
        assert_eq!(drivers.get("secondary").unwrap().database(), "other");
    }

    #[test]
    fn test_connect_same_name_disconnects_previous() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        let mut drivers = DriverRegistry::<MemoryDriver>::new();

        let (first, second) = rt.block_on(async {
            let Outcome::Ok(first) = drivers.connect(&cx, "memory:///sample", None).await else {
                panic!("first connect failed");
            };
            let Outcome::Ok(second) = drivers.connect(&cx, "memory:///sample", None).await else {
                panic!("second connect failed");
            };
            (first, second)
        });
        assert!(!first.is_connected());
        assert!(second.is_connected());
        assert_eq!(drivers.names(), ["sample"]);
        assert!(Arc::ptr_eq(drivers.get("sample").unwrap(), &second));
    }

    #[test]
    fn test_connect_rejects_unknown_scheme() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        let mut drivers = DriverRegistry::<MemoryDriver>::new();

        let outcome = rt.block_on(drivers.connect(&cx, "mysql://localhost/sample", None));
        match outcome {
            Outcome::Err(Error::InvalidScheme { scheme }) => assert_eq!(scheme, "mysql"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(drivers.names().is_empty());
    }

    #[test]
    fn test_get_and_disconnect_unregistered() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        let mut drivers = DriverRegistry::<MemoryDriver>::new();
        assert_eq!(
            drivers.get("sample").unwrap_err(),
            Error::DriverNotRegistered {
                name: "sample".into()
            }
        );

        let driver = drivers.insert("sample", MemoryDriver::new("sample"));
        rt.block_on(async {
            assert!(matches!(
                drivers.disconnect(&cx, "sample").await,
                Outcome::Ok(())
            ));
            assert!(matches!(
                drivers.disconnect(&cx, "sample").await,
                Outcome::Err(Error::DriverNotRegistered { .. })
            ));
        });
        assert!(!driver.is_connected());
        assert!(!drivers.contains("sample"));
    }
}
