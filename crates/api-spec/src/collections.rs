//! API collections and URL builders.
//!
//! Every collection lives directly under the API entrypoint, so each one
//! gets a pair of generated helpers on [`ApiUrls`]:
//!
//! | Helper | Path |
//! |--------|------|
//! | `vms_url()` | `[entrypoint]/vms` |
//! | `vms_url_id(id)` | `[entrypoint]/vms/[id]` |

use std::fmt;
use std::str::FromStr;

use crate::error::SpecError;

macro_rules! api_collections {
    ($($name:ident),* $(,)?) => {
        paste::paste! {
            /// A REST collection exposed under the API entrypoint.
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub enum Collection {
                $(
                    #[doc = concat!("The `", stringify!($name), "` collection.")]
                    [<$name:camel>],
                )*
            }

            impl Collection {
                /// All collections, in path order.
                pub const ALL: &'static [Collection] = &[$(Collection::[<$name:camel>]),*];

                /// Returns the path segment of the collection.
                pub fn as_str(&self) -> &'static str {
                    match self {
                        $(Collection::[<$name:camel>] => stringify!($name),)*
                    }
                }
            }

            impl FromStr for Collection {
                type Err = SpecError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    match s {
                        $(stringify!($name) => Ok(Collection::[<$name:camel>]),)*
                        _ => Err(SpecError::NotACollection(s.to_string())),
                    }
                }
            }

            impl ApiUrls {
                $(
                    #[doc = concat!("Returns the `", stringify!($name), "` collection URL.")]
                    pub fn [<$name _url>](&self) -> String {
                        self.collection_url(Collection::[<$name:camel>])
                    }

                    #[doc = concat!("Returns the URL of one `", stringify!($name), "` resource.")]
                    pub fn [<$name _url_id>](&self, id: impl fmt::Display) -> String {
                        self.resource_url(Collection::[<$name:camel>], id)
                    }
                )*
            }
        }
    };
}

api_collections! {
    automation_requests,
    availability_zones,
    clusters,
    conditions,
    data_stores,
    events,
    flavors,
    groups,
    hosts,
    policies,
    policy_actions,
    policy_profiles,
    providers,
    provision_requests,
    request_tasks,
    requests,
    resource_pools,
    roles,
    security_groups,
    servers,
    service_catalogs,
    service_requests,
    service_templates,
    services,
    tags,
    tasks,
    templates,
    users,
    vms,
    zones,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Collection {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// URL builders rooted at the API entrypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUrls {
    entrypoint: String,
}

impl ApiUrls {
    /// Creates URL builders for the given entrypoint (e.g. `/api`).
    pub fn new(entrypoint: impl Into<String>) -> Self {
        Self {
            entrypoint: entrypoint.into(),
        }
    }

    /// Returns the API entrypoint URL.
    pub fn entrypoint_url(&self) -> String {
        self.entrypoint.clone()
    }

    /// Returns the authentication URL.
    pub fn auth_url(&self) -> String {
        format!("{}/auth", self.entrypoint)
    }

    /// Returns the URL of a collection.
    pub fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.entrypoint, collection)
    }

    /// Returns the URL of one resource in a collection.
    pub fn resource_url(&self, collection: Collection, id: impl fmt::Display) -> String {
        format!("{}/{}/{}", self.entrypoint, collection, id)
    }

    /// Returns the collection URL, or the resource URL when an id is given.
    pub fn url_for(&self, collection: Collection, id: Option<&str>) -> String {
        match id {
            Some(id) => self.resource_url(collection, id),
            None => self.collection_url(collection),
        }
    }
}
