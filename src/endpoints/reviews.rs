use async_trait::async_trait;
use chrono::Local;
use serde_json::{json, Value};

use super::{GENERIC_TAG, RPC_REVIEWS};
use crate::extract::{field_map, into_record, ExtractionResult, FieldMap, FieldSpec};
use crate::models::{Review, ReviewsResult};
use crate::options::ReviewsOptions;
use crate::paginate::{paginate, ContinuationState, PageLayout, PageSource};
use crate::transform::Transform;
use crate::{info_time, path, Client, Result, BASE_URL, REVIEWS_PAGE_SIZE};

pub fn review_fields() -> FieldMap {
    field_map([
        ("id", FieldSpec::new(path![0])),
        ("userName", FieldSpec::new(path![1, 0])),
        ("userImage", FieldSpec::new(path![1, 1, 3, 2])),
        ("date", FieldSpec::new(path![5]).with_transform(Transform::Timestamp)),
        ("score", FieldSpec::new(path![2]).with_transform(Transform::ToInt)),
        ("scoreText", FieldSpec::new(path![2]).with_transform(Transform::IntToString)),
        ("text", FieldSpec::new(path![4])),
        ("replyDate", FieldSpec::new(path![7, 2]).with_transform(Transform::Timestamp)),
        ("replyText", FieldSpec::new(path![7, 1]).with_transform(Transform::NonEmpty)),
        ("version", FieldSpec::new(path![10]).with_transform(Transform::NonEmpty)),
        ("thumbsUp", FieldSpec::new(path![6]).with_transform(Transform::ToInt)),
        ("criterias", FieldSpec::new(path![12, 0]).with_transform(Transform::Criterias)),
    ])
}

/// The inner `UsvDTd` request. The first page goes out with a null token.
pub(crate) fn reviews_request(app_id: &str, sort_code: u8, token: Option<&str>) -> Value {
    json!([
        null,
        null,
        [2, sort_code, [REVIEWS_PAGE_SIZE, null, token], null, []],
        [app_id, 7]
    ])
}

pub(crate) fn reviews_layout() -> PageLayout {
    PageLayout {
        items: path![0],
        token: path![1, 1],
        fields: review_fields(),
    }
}

/// Links each review to its permalink on the details page.
pub(crate) fn into_reviews(items: Vec<ExtractionResult>, app_id: &str) -> Result<Vec<Review>> {
    items
        .into_iter()
        .map(|item| {
            let mut review: Review = into_record(item)?;
            review.url = format!("{BASE_URL}/store/apps/details?id={app_id}&reviewId={}", review.id);
            Ok(review)
        })
        .collect()
}

struct ReviewPages<'a> {
    client: &'a Client,
    options: &'a ReviewsOptions,
    layout: PageLayout,
}

#[async_trait]
impl PageSource for ReviewPages<'_> {
    fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// An empty or non-array payload ends the listing like a null one does.
    async fn fetch_page(&self, token: Option<&str>) -> Result<Option<Value>> {
        let options = self.options;
        let inner = reviews_request(&options.app_id, options.sort.code(), token);
        let payload = self
            .client
            .rpc(RPC_REVIEWS, &inner, Some(GENERIC_TAG), &options.lang, &options.country, &options.call)
            .await?;
        Ok(payload.filter(|page| page.as_array().is_some_and(|items| !items.is_empty())))
    }
}

impl Client {
    /// Reviews of one app. With `paginate` set a single page comes back along with the
    /// token for the next one.
    pub async fn reviews(&self, options: ReviewsOptions) -> Result<ReviewsResult> {
        let options = options.normalized()?;
        self.memoized("reviews", &options, || self.fetch_reviews(&options))
            .await
    }

    async fn fetch_reviews(&self, options: &ReviewsOptions) -> Result<ReviewsResult> {
        let start_time = Local::now();
        let pages = ReviewPages {
            client: self,
            options,
            layout: reviews_layout(),
        };

        let mut state = ContinuationState::resume(options.num, options.next_pagination_token.clone());
        if options.paginate {
            state = state.with_round_limit(1);
        }
        let outcome = paginate(&pages, state).await?;

        let data = into_reviews(outcome.items, &options.app_id)?;
        info_time!(start_time, "Fetched {} reviews of {}", data.len(), options.app_id);
        Ok(ReviewsResult {
            data,
            next_pagination_token: outcome.next_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::extract::extract_list;

    #[test]
    fn request_carries_sort_page_size_and_token() {
        let first = reviews_request("com.example", 2, None);
        assert_eq!(
            first,
            json!([null, null, [2, 2, [150, null, null], null, []], ["com.example", 7]])
        );
        let next = reviews_request("com.example", 3, Some("CsYB"));
        assert_eq!(next[2], json!([2, 3, [150, null, "CsYB"], null, []]));
    }

    #[test]
    fn maps_a_review_page() {
        let mut review = vec![Value::Null; 13];
        review[0] = json!("gp:AOqp");
        review[1] = json!(["Ana", [null, null, null, [null, null, "https://img/ana"]]]);
        review[2] = json!(4);
        review[4] = json!("Solid app");
        review[5] = json!([1_600_000_000, 0]);
        review[6] = json!(12);
        review[7] = json!([null, "Thanks!", [1_600_086_400, 250_000_000]]);
        review[10] = json!("");
        review[12] = json!([[["vaf_never_display_ads", [5]]]]);
        let page = json!([[review], [null, "next"]]);

        let layout = reviews_layout();
        assert_eq!(layout.token(&page).as_deref(), Some("next"));

        let reviews = into_reviews(extract_list(&page, &layout.items, &layout.fields), "com.example").unwrap();
        let review = &reviews[0];
        assert_eq!(review.id, "gp:AOqp");
        assert_eq!(review.user_name, "Ana");
        assert_eq!(review.user_image, "https://img/ana");
        assert_eq!(review.score, 4);
        assert_eq!(review.score_text, "4");
        assert_eq!(review.date, "2020-09-13T12:26:40Z");
        assert_eq!(review.reply_text.as_deref(), Some("Thanks!"));
        assert_eq!(review.reply_date.as_deref(), Some("2020-09-14T12:26:40.250Z"));
        assert_eq!(review.version, None);
        assert_eq!(review.title, None);
        assert_eq!(review.thumbs_up, Some(12));
        assert_eq!(review.criterias[0].criteria, "vaf_never_display_ads");
        assert_eq!(review.criterias[0].rating, Some(5));
        assert_eq!(
            review.url,
            "https://play.google.com/store/apps/details?id=com.example&reviewId=gp:AOqp"
        );
    }
}
