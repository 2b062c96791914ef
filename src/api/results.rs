use rocket::Route;

use crate::{
    election::ResultAggregator,
    error::Result,
    model::{
        api::{CandidateResult, Envelope, PositionThreshold, ResultsSummary},
        auth::ReadAccess,
        mongodb::Id,
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_results,
        get_results_summary,
        get_results_by_position,
        get_position_thresholds,
    ]
}

#[get("/results")]
async fn get_results(
    _access: ReadAccess,
    results: ResultAggregator<'_>,
) -> Result<Envelope<Vec<CandidateResult>>> {
    let results = results.get_all_results().await?;
    Ok(Envelope::ok(results, "Results retrieved"))
}

#[get("/results/summary")]
async fn get_results_summary(
    _access: ReadAccess,
    results: ResultAggregator<'_>,
) -> Result<Envelope<ResultsSummary>> {
    let summary = results.get_results_summary().await?;
    Ok(Envelope::ok(summary, "Results summary retrieved"))
}

/// A position ID that does not parse names no position, so it has no results.
#[get("/results/position/<position_id>")]
async fn get_results_by_position(
    _access: ReadAccess,
    position_id: &str,
    results: ResultAggregator<'_>,
) -> Result<Envelope<Vec<CandidateResult>>> {
    let results = match position_id.parse::<Id>() {
        Ok(id) => results.get_results_by_position(id).await?,
        Err(_) => Vec::new(),
    };
    Ok(Envelope::ok(results, "Position results retrieved"))
}

#[get("/results/positions")]
async fn get_position_thresholds(
    _access: ReadAccess,
    results: ResultAggregator<'_>,
) -> Result<Envelope<Vec<PositionThreshold>>> {
    let thresholds = results.get_results_position().await?;
    Ok(Envelope::ok(thresholds, "Position thresholds retrieved"))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::Client,
        serde::json::{json, Value},
    };

    use crate::model::api::{ApiId, CandidateSpec, PositionSpec, VoteSpec};

    use super::*;

    async fn post(client: &Client, auth: &Header<'static>, uri: &'static str, body: Value) -> ApiId {
        let response = client
            .post(uri)
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(body.to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        let body: Value = response.into_json().await.unwrap();
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    #[backend_test(admin)]
    async fn position_results_and_summary(client: Client, auth: Header<'static>) {
        let mayor = post(&client, &auth, "/positions", json!(PositionSpec::example())).await;
        let ada = post(
            &client,
            &auth,
            "/candidates",
            json!(CandidateSpec::example(Some(mayor.to_string()))),
        )
        .await;
        let bruno = post(
            &client,
            &auth,
            "/candidates",
            json!(CandidateSpec::example2(Some(mayor.to_string()))),
        )
        .await;
        post(&client, &auth, "/votes", json!(VoteSpec::example("001", ada, 10))).await;
        post(&client, &auth, "/votes", json!(VoteSpec::example("001", bruno, 15))).await;

        let response = client
            .get(format!("/results/position/{mayor}"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let results: Envelope<Vec<CandidateResult>> = response.into_json().await.unwrap();
        let totals: Vec<_> = results
            .data
            .iter()
            .map(|result| (result.candidate_id, result.total_votes))
            .collect();
        assert_eq!(totals, vec![(ada, 10), (bruno, 15)]);
        assert_eq!(results.data[0].position_name.as_deref(), Some("Mayor"));

        let response = client.get(uri!(get_results_summary)).dispatch().await;
        let summary: Envelope<ResultsSummary> = response.into_json().await.unwrap();
        assert_eq!(summary.data.total_candidates, 2);
        assert_eq!(summary.data.total_votes, 25);

        let response = client.get(uri!(get_results)).dispatch().await;
        let all: Envelope<Vec<CandidateResult>> = response.into_json().await.unwrap();
        assert_eq!(all.data, summary.data.results);
    }

    #[backend_test(chief)]
    async fn any_role_reads_thresholds(client: Client, auth: Header<'static>) {
        let response = client
            .get(uri!(get_position_thresholds))
            .header(auth)
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let thresholds: Envelope<Vec<PositionThreshold>> = response.into_json().await.unwrap();
        assert!(thresholds.data.is_empty());
    }

    #[backend_test(admin)]
    async fn thresholds_are_whole_percentages(client: Client, auth: Header<'static>) {
        let council = post(&client, &auth, "/positions", json!(PositionSpec::example2())).await;
        let response = client.get(uri!(get_position_thresholds)).dispatch().await;
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(
            body["data"],
            json!([{
                "positionId": council.to_string(),
                "name": "Council",
                "totalVotesExpected": 250,
                "validPercentage": 25,
            }])
        );
    }

    #[backend_test]
    async fn unknown_position_has_no_results(client: Client) {
        for id in [Id::new().to_string(), "garbage".to_string()] {
            let response = client
                .get(format!("/results/position/{id}"))
                .dispatch()
                .await;
            assert_eq!(Status::Ok, response.status());
            let results: Envelope<Vec<CandidateResult>> = response.into_json().await.unwrap();
            assert!(results.data.is_empty());
        }
    }
}
