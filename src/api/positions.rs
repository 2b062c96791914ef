use rocket::{serde::json::Json, Route};

use crate::{
    election::PositionRegistry,
    error::Result,
    model::{
        api::{Envelope, PositionDescription, PositionPatch, PositionSpec},
        auth::{Caller, ReadAccess},
        mongodb::Id,
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_positions,
        get_position,
        create_position,
        update_position,
        delete_position,
    ]
}

#[get("/positions")]
async fn get_positions(
    _access: ReadAccess,
    positions: PositionRegistry<'_>,
) -> Result<Envelope<Vec<PositionDescription>>> {
    let positions = positions.get_all().await?;
    Ok(Envelope::ok(positions, "Positions retrieved"))
}

#[get("/positions/<id>")]
async fn get_position(
    _access: ReadAccess,
    id: Id,
    positions: PositionRegistry<'_>,
) -> Result<Envelope<PositionDescription>> {
    let position = positions.get_one(id).await?;
    Ok(Envelope::ok(position, "Position retrieved"))
}

#[post("/positions", data = "<spec>")]
async fn create_position(
    caller: Caller,
    spec: Json<PositionSpec>,
    positions: PositionRegistry<'_>,
) -> Result<Envelope<PositionDescription>> {
    let position = positions.create(&caller, spec.0).await?;
    Ok(Envelope::created(position, "Position created"))
}

#[patch("/positions/<id>", data = "<patch>")]
async fn update_position(
    caller: Caller,
    id: Id,
    patch: Json<PositionPatch>,
    positions: PositionRegistry<'_>,
) -> Result<Envelope<PositionDescription>> {
    let position = positions.update(&caller, id, patch.0).await?;
    Ok(Envelope::ok(position, "Position updated"))
}

#[delete("/positions/<id>")]
async fn delete_position(
    caller: Caller,
    id: Id,
    positions: PositionRegistry<'_>,
) -> Result<Envelope<()>> {
    positions.delete(&caller, id).await?;
    Ok(Envelope::empty("Position deleted"))
}
