pub mod anilist;
pub mod gemini;
