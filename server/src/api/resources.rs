//! The content types of the site.

use axum::http::StatusCode;

use super::resource::{ImageField, Resource, UpdatePolicy};
use crate::models::Collection;

const IMAGE_KEY: &str = "image";

pub struct Education;

impl Resource for Education {
    const COLLECTION: Collection = Collection::Education;
    const NAME: &'static str = "Education";
    const REQUIRED: &'static [&'static str] = &["institute", "startYear", "endYear", "duration"];
    const OPTIONAL: &'static [&'static str] = &["description"];
    const UPDATE: UpdatePolicy = UpdatePolicy::Replace;
    const MISSING_ON_UPDATE_STATUS: StatusCode = StatusCode::BAD_REQUEST;
    const LIST_ENVELOPE: Option<&'static str> = Some("response");
}

pub struct Skill;

impl Resource for Skill {
    const COLLECTION: Collection = Collection::Skills;
    const NAME: &'static str = "Skill";
    const REQUIRED: &'static [&'static str] = &["skillName", "level", "stack"];
    const IMAGE: Option<ImageField> = Some(ImageField {
        key: "imageUrl",
        required: true,
    });
    const UPDATE: UpdatePolicy = UpdatePolicy::Set(&["skillName", "level", "stack"]);
    const UNIQUE_KEY: Option<&'static str> = Some("skillName");
    const CONFLICT_STATUS: StatusCode = StatusCode::UNAUTHORIZED;
    const LIST_ENVELOPE: Option<&'static str> = Some("response");
}

pub struct Project;

impl Resource for Project {
    const COLLECTION: Collection = Collection::Projects;
    const NAME: &'static str = "Project";
    const REQUIRED: &'static [&'static str] =
        &["title", "description", "githubLink", "linkedinLink"];
    const IMAGE: Option<ImageField> = Some(ImageField {
        key: IMAGE_KEY,
        required: false,
    });
    const UPDATE: UpdatePolicy =
        UpdatePolicy::Set(&["title", "description", "githubLink", "linkedinLink"]);
}

pub struct Competition;

impl Resource for Competition {
    const COLLECTION: Collection = Collection::Competitions;
    const NAME: &'static str = "Competition";
    const REQUIRED: &'static [&'static str] = &["competitionName", "description", "position"];
    const IMAGE: Option<ImageField> = Some(ImageField {
        key: IMAGE_KEY,
        required: true,
    });
    const UPDATE: UpdatePolicy =
        UpdatePolicy::Set(&["competitionName", "description", "position"]);
}

pub struct Blog;

impl Resource for Blog {
    const COLLECTION: Collection = Collection::Blogs;
    const NAME: &'static str = "Blog";
    const REQUIRED: &'static [&'static str] = &["title"];
    const OPTIONAL: &'static [&'static str] = &["content", "link"];
    const IMAGE: Option<ImageField> = Some(ImageField {
        key: IMAGE_KEY,
        required: true,
    });
    const UPDATE: UpdatePolicy = UpdatePolicy::Set(&["title", "content"]);
    const CREATED_AT_KEY: Option<&'static str> = Some("createdAt");
}
