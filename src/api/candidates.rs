use rocket::{serde::json::Json, Route};

use crate::{
    election::CandidateRegistry,
    error::Result,
    model::{
        api::{CandidateDescription, CandidatePatch, CandidateSpec, Envelope, PositionSummary},
        auth::{Caller, ReadAccess},
        mongodb::Id,
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_candidates,
        get_candidate,
        get_candidate_position,
        create_candidate,
        update_candidate,
        delete_candidate,
    ]
}

#[get("/candidates")]
async fn get_candidates(
    _access: ReadAccess,
    candidates: CandidateRegistry<'_>,
) -> Result<Envelope<Vec<CandidateDescription>>> {
    let candidates = candidates.get_all().await?;
    Ok(Envelope::ok(candidates, "Candidates retrieved"))
}

#[get("/candidates/<id>")]
async fn get_candidate(
    _access: ReadAccess,
    id: Id,
    candidates: CandidateRegistry<'_>,
) -> Result<Envelope<CandidateDescription>> {
    let candidate = candidates.get_one(id).await?;
    Ok(Envelope::ok(candidate, "Candidate retrieved"))
}

#[get("/candidates/<id>/position")]
async fn get_candidate_position(
    _access: ReadAccess,
    id: Id,
    candidates: CandidateRegistry<'_>,
) -> Result<Envelope<Option<PositionSummary>>> {
    let position = candidates.get_position(id).await?;
    let message = if position.is_some() {
        "Position retrieved"
    } else {
        "Candidate has no position"
    };
    Ok(Envelope::ok(position, message))
}

#[post("/candidates", data = "<spec>")]
async fn create_candidate(
    caller: Caller,
    spec: Json<CandidateSpec>,
    candidates: CandidateRegistry<'_>,
) -> Result<Envelope<CandidateDescription>> {
    let candidate = candidates.create(&caller, spec.0).await?;
    Ok(Envelope::created(candidate, "Candidate created"))
}

#[patch("/candidates/<id>", data = "<patch>")]
async fn update_candidate(
    caller: Caller,
    id: Id,
    patch: Json<CandidatePatch>,
    candidates: CandidateRegistry<'_>,
) -> Result<Envelope<CandidateDescription>> {
    let candidate = candidates.update(&caller, id, patch.0).await?;
    Ok(Envelope::ok(candidate, "Candidate updated"))
}

#[delete("/candidates/<id>")]
async fn delete_candidate(
    caller: Caller,
    id: Id,
    candidates: CandidateRegistry<'_>,
) -> Result<Envelope<()>> {
    candidates.delete(&caller, id).await?;
    Ok(Envelope::empty("Candidate deleted"))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::Client,
        serde::json::{json, Value},
    };

    use crate::model::{
        api::{PositionDescription, PositionSpec},
        Store,
    };

    use super::*;

    async fn create_position(client: &Client, auth: &Header<'static>) -> PositionDescription {
        let response = client
            .post("/positions")
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!(PositionSpec::example()).to_string())
            .dispatch()
            .await;
        let envelope: Envelope<PositionDescription> = response.into_json().await.unwrap();
        envelope.data
    }

    async fn create(
        client: &Client,
        auth: &Header<'static>,
        spec: CandidateSpec,
    ) -> (Status, Value) {
        let response = client
            .post(uri!(create_candidate))
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        (response.status(), response.into_json().await.unwrap())
    }

    #[backend_test(admin)]
    async fn create_and_resolve_position(client: Client, auth: Header<'static>) {
        let mayor = create_position(&client, &auth).await;
        let (status, body) = create(
            &client,
            &auth,
            CandidateSpec::example(Some(mayor.id.to_string())),
        )
        .await;
        assert_eq!(Status::Created, status);
        assert_eq!(body["data"]["name"], "Ada Quispe");
        assert_eq!(body["data"]["imageId"], "img-ada");
        assert_eq!(body["data"]["position"]["name"], "Mayor");
        let id: Id = body["data"]["id"].as_str().unwrap().parse().unwrap();

        let response = client
            .get(uri!(get_candidate_position(id)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let position: Envelope<Option<PositionSummary>> = response.into_json().await.unwrap();
        assert_eq!(position.data.unwrap().id, mayor.id);

        let response = client.get(uri!(get_candidates)).dispatch().await;
        let all: Envelope<Vec<CandidateDescription>> = response.into_json().await.unwrap();
        assert_eq!(all.data.len(), 1);
        assert_eq!(*all.data[0].id, id);
    }

    #[backend_test(admin)]
    async fn unknown_position_is_not_found(client: Client, auth: Header<'static>, store: Store) {
        let (status, body) = create(
            &client,
            &auth,
            CandidateSpec::example(Some(Id::new().to_string())),
        )
        .await;
        assert_eq!(Status::NotFound, status);
        assert_eq!(body["error"], "NotFoundError");
        assert!(store
            .find_candidates(&Default::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[backend_test(admin)]
    async fn patch_clears_image(client: Client, auth: Header<'static>) {
        let (_, body) = create(&client, &auth, CandidateSpec::example(None)).await;
        let id: Id = body["data"]["id"].as_str().unwrap().parse().unwrap();

        let response = client
            .patch(uri!(update_candidate(id)))
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!({ "imageId": null, "order": 4 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let updated: Envelope<CandidateDescription> = response.into_json().await.unwrap();
        assert_eq!(updated.data.image_id, None);
        assert_eq!(updated.data.order, 4);
        assert_eq!(updated.data.name, "Ada Quispe");
    }

    #[backend_test(desk)]
    async fn desk_cannot_delete(client: Client, auth: Header<'static>, store: Store) {
        let candidate = store
            .insert_candidate(crate::model::db::CandidateCore::example(None))
            .await
            .unwrap();
        let response = client
            .delete(uri!(delete_candidate(candidate.id)))
            .header(auth)
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
        assert!(store.find_candidate(candidate.id).await.unwrap().is_some());
    }
}
