use rocket::{serde::json::Json, Route};

use crate::{
    election::VoteLedger,
    error::{Error, Result},
    model::{
        api::{Envelope, VoteDescription, VotePatch, VoteSpec},
        auth::{Caller, ReadAccess},
        mongodb::Id,
        store::VoteFilter,
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_votes,
        get_vote,
        create_vote,
        update_vote,
        replace_vote,
        delete_vote,
    ]
}

/// Optional filters on the tally list.
#[derive(Debug, FromForm)]
struct VoteQuery {
    mesa: Option<String>,
    #[field(name = "candidateId")]
    candidate_id: Option<String>,
}

impl VoteQuery {
    fn into_filter(self) -> Result<VoteFilter> {
        let candidate_id = self
            .candidate_id
            .map(|raw| {
                raw.trim()
                    .parse::<Id>()
                    .map_err(|_| Error::validation(format!("invalid candidateId '{raw}'")))
            })
            .transpose()?;
        Ok(VoteFilter {
            mesa: self.mesa.map(|mesa| mesa.trim().to_string()),
            candidate_id,
        })
    }
}

#[get("/votes?<query..>")]
async fn get_votes(
    _access: ReadAccess,
    query: VoteQuery,
    ledger: VoteLedger<'_>,
) -> Result<Envelope<Vec<VoteDescription>>> {
    let filter = query.into_filter()?;
    let votes = match filter {
        VoteFilter {
            mesa: Some(ref mesa),
            candidate_id: None,
        } => ledger.get_by_mesa(mesa).await?,
        VoteFilter {
            mesa: None,
            candidate_id: Some(candidate_id),
        } => ledger.get_by_candidate(candidate_id).await?,
        _ => ledger.get_all(&filter).await?,
    };
    Ok(Envelope::ok(votes, "Votes retrieved"))
}

#[get("/votes/<id>")]
async fn get_vote(
    _access: ReadAccess,
    id: Id,
    ledger: VoteLedger<'_>,
) -> Result<Envelope<VoteDescription>> {
    let vote = ledger.get_one(id).await?;
    Ok(Envelope::ok(vote, "Vote retrieved"))
}

#[post("/votes", data = "<spec>")]
async fn create_vote(
    caller: Caller,
    spec: Json<VoteSpec>,
    ledger: VoteLedger<'_>,
) -> Result<Envelope<VoteDescription>> {
    let vote = ledger.create(&caller, spec.0).await?;
    Ok(Envelope::created(vote, "Vote recorded"))
}

#[patch("/votes/<id>", data = "<patch>")]
async fn update_vote(
    caller: Caller,
    id: Id,
    patch: Json<VotePatch>,
    ledger: VoteLedger<'_>,
) -> Result<Envelope<VoteDescription>> {
    let vote = ledger.update(&caller, id, patch.0).await?;
    Ok(Envelope::ok(vote, "Vote updated"))
}

/// Older clients correct tallies with `PUT`.
#[put("/votes/<id>", data = "<patch>")]
async fn replace_vote(
    caller: Caller,
    id: Id,
    patch: Json<VotePatch>,
    ledger: VoteLedger<'_>,
) -> Result<Envelope<VoteDescription>> {
    update_vote(caller, id, patch, ledger).await
}

#[delete("/votes/<id>")]
async fn delete_vote(caller: Caller, id: Id, ledger: VoteLedger<'_>) -> Result<Envelope<()>> {
    ledger.delete(&caller, id).await?;
    Ok(Envelope::empty("Vote deleted"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::Client,
        serde::json::{json, Value},
    };

    use crate::model::{
        api::{ApiId, CandidateSpec},
        auth::Role,
        MemoryStore, Store,
    };

    use super::*;

    async fn candidate(client: &Client, auth: &Header<'static>, spec: CandidateSpec) -> ApiId {
        let response = client
            .post("/candidates")
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        let body: Value = response.into_json().await.unwrap();
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    async fn record(client: &Client, auth: &Header<'static>, spec: VoteSpec) -> (Status, Value) {
        let response = client
            .post(uri!(create_vote))
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        (response.status(), response.into_json().await.unwrap())
    }

    #[backend_test(admin)]
    async fn duplicate_tally_conflicts(client: Client, auth: Header<'static>, store: Store) {
        let ada = candidate(&client, &auth, CandidateSpec::example(None)).await;

        let (status, body) = record(&client, &auth, VoteSpec::example("001", ada, 10)).await;
        assert_eq!(Status::Created, status);
        assert_eq!(body["status"], 201);
        assert_eq!(body["data"]["candidateName"], "Ada Quispe");
        assert_eq!(body["data"]["voteType"], "PERSONAL");

        let (status, body) = record(&client, &auth, VoteSpec::example("001", ada, 5)).await;
        assert_eq!(Status::Conflict, status);
        assert_eq!(body["error"], "ConflictError");
        assert!(body["message"].as_str().unwrap().contains("DuplicateVote"));

        let votes = store.find_votes(&VoteFilter::default()).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].vote_count, 10);
    }

    #[backend_test(admin)]
    async fn body_without_content_type(client: Client, auth: Header<'static>) {
        let ada = candidate(&client, &auth, CandidateSpec::example(None)).await;
        let response = client
            .post(uri!(create_vote))
            .header(auth.clone())
            .body(json!(VoteSpec::example("001", ada, 4)).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());

        // A body that is not JSON is a validation failure, not a missing route.
        let response = client
            .post(uri!(create_vote))
            .header(auth.clone())
            .body("mesa=001")
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "ValidationError");
    }

    #[backend_test(chief)]
    async fn chief_cannot_record(client: Client, auth: Header<'static>, store: Store) {
        let ada = store
            .insert_candidate(crate::model::db::CandidateCore::example(None))
            .await
            .unwrap();
        let (status, body) = record(&client, &auth, VoteSpec::example("001", ada.id, 10)).await;
        assert_eq!(Status::Forbidden, status);
        assert_eq!(body["error"], "AuthorizationError");
        assert!(store
            .find_votes(&VoteFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[backend_test(admin)]
    async fn negative_count_rejected(client: Client, auth: Header<'static>) {
        let ada = candidate(&client, &auth, CandidateSpec::example(None)).await;
        let (status, body) = record(&client, &auth, VoteSpec::example("001", ada, -3)).await;
        assert_eq!(Status::BadRequest, status);
        assert_eq!(body["error"], "ValidationError");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("vote count cannot be negative"));

        let (_, body) = record(&client, &auth, VoteSpec::example("001", ada, 8)).await;
        let id: Id = body["data"]["id"].as_str().unwrap().parse().unwrap();

        // Both verbs correct a tally, and a rejected correction changes nothing.
        let response = client
            .put(uri!(replace_vote(id)))
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!({ "voteCount": -1 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        let response = client.get(uri!(get_vote(id))).dispatch().await;
        let vote: Envelope<VoteDescription> = response.into_json().await.unwrap();
        assert_eq!(vote.data.vote_count, 8);

        let response = client
            .patch(uri!(update_vote(id)))
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!({ "voteCount": 9 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let vote: Envelope<VoteDescription> = response.into_json().await.unwrap();
        assert_eq!(vote.data.vote_count, 9);
    }

    #[backend_test(admin)]
    async fn query_filters(client: Client, auth: Header<'static>) {
        let ada = candidate(&client, &auth, CandidateSpec::example(None)).await;
        let bruno = candidate(&client, &auth, CandidateSpec::example2(None)).await;
        for (mesa, id, count) in [("001", ada, 10), ("002", ada, 3), ("001", bruno, 15)] {
            let (status, _) = record(&client, &auth, VoteSpec::example(mesa, id, count)).await;
            assert_eq!(Status::Created, status);
        }

        let count = |body: Value| body["data"].as_array().unwrap().len();
        let get = |uri: String| {
            let client = &client;
            async move {
                let response = client.get(uri).dispatch().await;
                assert_eq!(Status::Ok, response.status());
                response.into_json::<Value>().await.unwrap()
            }
        };

        assert_eq!(count(get("/votes".to_string()).await), 3);
        assert_eq!(count(get("/votes?mesa=001".to_string()).await), 2);
        assert_eq!(count(get(format!("/votes?candidateId={ada}")).await), 2);
        let both = get(format!("/votes?mesa=002&candidateId={ada}")).await;
        assert_eq!(count(both.clone()), 1);
        assert_eq!(both["data"][0]["voteCount"], 3);

        let response = client.get("/votes?candidateId=bogus").dispatch().await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test(admin)]
    async fn delete_tally(client: Client, auth: Header<'static>) {
        let ada = candidate(&client, &auth, CandidateSpec::example(None)).await;
        let (_, body) = record(&client, &auth, VoteSpec::example("001", ada, 1)).await;
        let id: Id = body["data"]["id"].as_str().unwrap().parse().unwrap();

        let response = client
            .delete(uri!(delete_vote(id)))
            .header(auth.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let response = client
            .delete(uri!(delete_vote(id)))
            .header(auth.clone())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[rocket::async_test]
    async fn authenticated_read_policy() {
        let store: Store = Arc::new(MemoryStore::new());
        let figment = crate::test_figment().merge(("read_policy", "authenticated"));
        let client = Client::tracked(crate::rocket_for_store(figment, store))
            .await
            .unwrap();

        let response = client.get("/votes").dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "AuthorizationError");

        // Any role may read.
        let response = client
            .get("/votes")
            .header(crate::auth_header(Role::MesaDePartes))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
    }
}
