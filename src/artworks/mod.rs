mod favorites;
mod gallery;
mod page;

use axum::{routing::{get, post}, Router};
use serde::Deserialize;

use crate::AppState;

pub use favorites::toggle_favorite;
pub use page::add_comment;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(gallery::gallery))
        .route("/new", get(gallery::new_artwork_page).post(gallery::new_artwork))
        .route("/favorites", get(favorites::favorites))
        .route("/{uuid}", get(page::artwork))
        .route("/{uuid}/comments", post(page::comment))
        .route("/{uuid}/delete", post(page::delete))
        .route("/{uuid}/favorite", post(favorites::favorite))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Digital,
    Traditional,
    Illustration,
    Concept,
    Character,
    Landscape,
    Portrait,
    Abstract,
    Fantasy,
    Scifi,
    Anime,
    Photography,
    #[serde(rename = "3d")]
    ThreeD,
    Pixel,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::Digital,
        Category::Traditional,
        Category::Illustration,
        Category::Concept,
        Category::Character,
        Category::Landscape,
        Category::Portrait,
        Category::Abstract,
        Category::Fantasy,
        Category::Scifi,
        Category::Anime,
        Category::Photography,
        Category::ThreeD,
        Category::Pixel,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        use Category::*;
        match self {
            Digital => "digital",
            Traditional => "traditional",
            Illustration => "illustration",
            Concept => "concept",
            Character => "character",
            Landscape => "landscape",
            Portrait => "portrait",
            Abstract => "abstract",
            Fantasy => "fantasy",
            Scifi => "scifi",
            Anime => "anime",
            Photography => "photography",
            ThreeD => "3d",
            Pixel => "pixel",
            Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        use Category::*;
        match self {
            Digital => "Digital Art",
            Traditional => "Traditional Art",
            Illustration => "Illustration",
            Concept => "Concept Art",
            Character => "Character Design",
            Landscape => "Landscape",
            Portrait => "Portrait",
            Abstract => "Abstract",
            Fantasy => "Fantasy",
            Scifi => "Sci-Fi",
            Anime => "Anime/Manga",
            Photography => "Photography",
            ThreeD => "3D Art",
            Pixel => "Pixel Art",
            Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_round_trip_through_their_slug() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse("watercolor"), None);
        assert_eq!(Category::default().as_str(), "other");
    }
}
