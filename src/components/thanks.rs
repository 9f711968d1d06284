use serde::Serialize;

use crate::api::meta_pixel::ConversionPixel;
use crate::content::{
    THANKS_CELEBRATION_IMAGE, THANKS_LINES, THANKS_SIGNATURE, THANKS_TITLE, THREADS_HANDLE,
    THREADS_LINK,
};

pub const LEAD_PIXEL_EVENT: &str = "Lead";

#[derive(Debug, Clone, Serialize)]
pub struct ThanksView {
    pub title: &'static str,
    pub lines: Vec<&'static str>,
    pub signature: &'static str,
    pub celebration_image: &'static str,
    pub threads_link: &'static str,
    pub threads_handle: &'static str,
}

/// Loads the post-signup confirmation view. Every load sends one "Lead" pixel signal.
pub fn load_thanks(pixel: &dyn ConversionPixel) -> ThanksView {
    pixel.track(LEAD_PIXEL_EVENT);
    ThanksView {
        title: THANKS_TITLE,
        lines: THANKS_LINES.to_vec(),
        signature: THANKS_SIGNATURE,
        celebration_image: THANKS_CELEBRATION_IMAGE,
        threads_link: THREADS_LINK,
        threads_handle: THREADS_HANDLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::meta_pixel::MockConversionPixel;
    use mockall::predicate::eq;

    #[test]
    fn each_load_fires_lead_once() {
        let mut pixel = MockConversionPixel::new();
        pixel.expect_track().with(eq("Lead")).times(2).return_const(());

        let view = load_thanks(&pixel);
        assert_eq!(view.title, THANKS_TITLE);
        assert_eq!(view.threads_link, THREADS_LINK);
        load_thanks(&pixel);
    }
}
