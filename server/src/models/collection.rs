use std::fmt;

/// The named document collections held by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    Login,
    Education,
    Skills,
    Projects,
    Competitions,
    Blogs,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Login,
        Collection::Education,
        Collection::Skills,
        Collection::Projects,
        Collection::Competitions,
        Collection::Blogs,
    ];

    /// Returns the collection's name, which is also its table name in SQL backends.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Collection::Login => "login",
            Collection::Education => "education",
            Collection::Skills => "skills",
            Collection::Projects => "projects",
            Collection::Competitions => "competitions",
            Collection::Blogs => "blogs",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
