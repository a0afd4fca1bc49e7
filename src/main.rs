mod app;
mod cli;
mod cloud;
mod collections;
mod config;
mod domain;
mod events;
mod filters;
mod images;
mod parser;
mod proximity;
mod recommendations;
mod routes;
mod storage;
mod trips;
mod user_places;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::{
        CityCommands, CollectionCommands, Commands, ProximityCommands, RouteCommands,
        TripCommands,
    };
    use domain::place::PlaceId;
    use parser::ParseInput;

    let cli = cli::Cli::parse();
    let mut config = config::Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    let app = app::App::open(&config)?;

    match cli.command {
        Commands::Add(args) => {
            let bucket =
                app.add_recommendation(&args.city, ParseInput::Text(args.text), args.country)?;
            print_json(&bucket);
        }
        Commands::Ls(args) => {
            let buckets = app.recommendations().list()?;
            let filter = filters::PlaceFilter {
                categories: args.categories,
                country: args.country,
            };
            print_json(&filters::filtered_groups(&buckets, &filter));
        }
        Commands::Visit(args) => {
            let place_id = PlaceId::from(args.place_id);
            if !app.mark_visited(&place_id, !args.unvisit)? {
                return Err(app::AppError::NotFound(format!("place '{}'", place_id)));
            }
            println!("{} marked {}", place_id, visited_word(!args.unvisit));
        }
        Commands::Edit(args) => {
            let place_id = PlaceId::from(args.place_id);
            let mut patch = recommendations::PlaceMetaPatch {
                description: args.description,
                website: args.website,
                ..recommendations::PlaceMetaPatch::default()
            };
            if let Some(text) = args.source.as_deref() {
                patch.source = Some(parser::attribution::auto_populate_source(text)
                    .unwrap_or(domain::place::Source {
                        kind: domain::place::SourceKind::Other,
                        name: text.to_string(),
                        url: None,
                    }));
            }
            if let Some(tip) = args.tip {
                let mut context = app
                    .recommendations()
                    .find_place(&place_id)?
                    .and_then(|place| place.context)
                    .unwrap_or_default();
                context.specific_tip = Some(tip);
                patch.context = Some(context);
            }
            if !app.recommendations().update_meta(&place_id, patch)? {
                return Err(app::AppError::NotFound(format!("place '{}'", place_id)));
            }
            println!("{} updated", place_id);
        }
        Commands::Rm(args) => {
            let place_id = PlaceId::from(args.place_id);
            if !app.delete_place(&place_id)? {
                return Err(app::AppError::NotFound(format!("place '{}'", place_id)));
            }
            println!("{} deleted", place_id);
        }
        Commands::Collection(command) => match command {
            CollectionCommands::New { name } => print_json(&app.collections().create(&name)?),
            CollectionCommands::Ls => print_json(&app.collections().list()?),
            CollectionCommands::Add {
                collection_id,
                place_id,
            } => {
                let added = app
                    .collections()
                    .add_place(&collection_id, &PlaceId::from(place_id))?;
                println!("{}", if added { "added" } else { "already a member" });
            }
            CollectionCommands::Rm {
                collection_id,
                place_id,
            } => {
                require(
                    app.collections()
                        .remove_place(&collection_id, &PlaceId::from(place_id))?,
                    || format!("collection '{}' membership", collection_id),
                )?;
                println!("removed");
            }
            CollectionCommands::RouteMode { collection_id, off } => {
                require(
                    app.collections().toggle_route_mode(&collection_id, !off)?,
                    || format!("collection '{}'", collection_id),
                )?;
                println!("route mode {}", if off { "disabled" } else { "enabled" });
            }
            CollectionCommands::Order {
                collection_id,
                place_ids,
            } => {
                let ordered = place_ids.into_iter().map(PlaceId::from).collect();
                require(
                    app.collections()
                        .update_ordered_place_ids(&collection_id, ordered)?,
                    || format!("collection '{}'", collection_id),
                )?;
                println!("order updated");
            }
            CollectionCommands::Rename {
                collection_id,
                name,
            } => {
                require(app.collections().rename(&collection_id, &name)?, || {
                    format!("collection '{}'", collection_id)
                })?;
                println!("renamed");
            }
            CollectionCommands::Delete { collection_id } => {
                require(app.collections().delete(&collection_id)?, || {
                    format!("collection '{}'", collection_id)
                })?;
                println!("deleted");
            }
        },
        Commands::Route(command) => match command {
            RouteCommands::New(args) => {
                let new = new_route_from_args(&app, args)?;
                print_json(&app.routes().create(new)?);
            }
            RouteCommands::FromCollection {
                collection_id,
                args,
            } => {
                let collection = app
                    .collections()
                    .get(&collection_id)?
                    .ok_or_else(|| {
                        app::AppError::NotFound(format!("collection '{}'", collection_id))
                    })?;
                let new = new_route_from_args(&app, args)?;
                print_json(&app.routes().create_from_collection(&collection, new)?);
            }
            RouteCommands::Ls => print_json(&app.routes().grouped()?),
            RouteCommands::Show { route_id } => {
                app.validate_route(&route_id)?;
                let route = app
                    .routes()
                    .get(&route_id)?
                    .ok_or_else(|| app::AppError::NotFound(format!("route '{}'", route_id)))?;
                print_json(&route);
            }
            RouteCommands::AddDay { route_id } => {
                println!("day {} added", app.routes().add_day(&route_id)?);
            }
            RouteCommands::RmDay { route_id, day } => {
                require(app.routes().remove_day(&route_id, day)?, || {
                    format!("empty day {} of route '{}'", day, route_id)
                })?;
                println!("day removed");
            }
            RouteCommands::Add {
                route_id,
                day,
                place_id,
            } => {
                let added = app
                    .routes()
                    .add_place(&route_id, day, &PlaceId::from(place_id))?;
                println!("{}", if added { "added" } else { "already in route" });
            }
            RouteCommands::Rm { route_id, place_id } => {
                require(
                    app.routes()
                        .remove_place(&route_id, &PlaceId::from(place_id))?,
                    || format!("place in route '{}'", route_id),
                )?;
                println!("removed");
            }
            RouteCommands::Reorder {
                route_id,
                day,
                place_ids,
            } => {
                let route = app
                    .routes()
                    .get(&route_id)?
                    .ok_or_else(|| app::AppError::NotFound(format!("route '{}'", route_id)))?;
                let current = route
                    .find_day(day)
                    .ok_or_else(|| app::AppError::NotFound(format!("day {}", day)))?;
                let ordered = reorder_refs(&current.places, &place_ids, |place| &place.place_id)?;
                app.routes().reorder(&route_id, day, ordered)?;
                println!("reordered");
            }
            RouteCommands::Visit {
                route_id,
                place_id,
                unvisit,
            } => {
                let place_id = PlaceId::from(place_id);
                require(
                    app.set_route_place_visited(&route_id, &place_id, !unvisit)?,
                    || format!("place in route '{}'", route_id),
                )?;
                println!("{} marked {}", place_id, visited_word(!unvisit));
            }
            RouteCommands::Day {
                route_id,
                day,
                label,
                date,
            } => {
                require(app.routes().update_day(&route_id, day, label, date)?, || {
                    format!("day {} of route '{}'", day, route_id)
                })?;
                println!("day updated");
            }
            RouteCommands::Delete { route_id } => {
                require(app.routes().delete(&route_id)?, || {
                    format!("route '{}'", route_id)
                })?;
                println!("deleted");
            }
        },
        Commands::Trip(command) => match command {
            TripCommands::New(args) => {
                let new = new_trip_from_args(&app, args)?;
                print_json(&app.trips().create(new)?);
            }
            TripCommands::Ls => print_json(&app.trips().list_with_progress()?),
            TripCommands::Show { trip_id } => {
                let trip = app
                    .trips()
                    .get(&trip_id)?
                    .ok_or_else(|| app::AppError::NotFound(format!("trip '{}'", trip_id)))?;
                print_json(&trip);
            }
            TripCommands::AddDay { trip_id } => {
                println!("day {} added", app.trips().add_day(&trip_id)?);
            }
            TripCommands::RmDay { trip_id, day } => {
                require(app.trips().remove_day(&trip_id, day)?, || {
                    format!("empty day {} of trip '{}'", day, trip_id)
                })?;
                println!("day removed");
            }
            TripCommands::Add {
                trip_id,
                day,
                place_id,
            } => {
                let added = app
                    .trips()
                    .add_place(&trip_id, day, &PlaceId::from(place_id))?;
                println!("{}", if added { "added" } else { "already in trip" });
            }
            TripCommands::Rm { trip_id, place_id } => {
                require(
                    app.trips().remove_place(&trip_id, &PlaceId::from(place_id))?,
                    || format!("place in trip '{}'", trip_id),
                )?;
                println!("removed");
            }
            TripCommands::Reorder {
                trip_id,
                day,
                place_ids,
            } => {
                let trip = app
                    .trips()
                    .get(&trip_id)?
                    .ok_or_else(|| app::AppError::NotFound(format!("trip '{}'", trip_id)))?;
                let current = trip
                    .find_day(day)
                    .ok_or_else(|| app::AppError::NotFound(format!("day {}", day)))?;
                let ordered = reorder_refs(&current.places, &place_ids, |place| &place.place_id)?;
                app.trips().reorder(&trip_id, day, ordered)?;
                println!("reordered");
            }
            TripCommands::Move {
                trip_id,
                from_day,
                to_day,
                place_id,
            } => {
                require(
                    app.trips()
                        .move_place(&trip_id, from_day, to_day, &PlaceId::from(place_id))?,
                    || format!("place on day {} of trip '{}'", from_day, trip_id),
                )?;
                println!("moved");
            }
            TripCommands::Visit {
                trip_id,
                place_id,
                unvisit,
            } => {
                let place_id = PlaceId::from(place_id);
                require(
                    app.set_trip_place_visited(&trip_id, &place_id, !unvisit)?,
                    || format!("place in trip '{}'", trip_id),
                )?;
                println!("{} marked {}", place_id, visited_word(!unvisit));
            }
            TripCommands::Day {
                trip_id,
                day,
                label,
                date,
                theme,
            } => {
                require(
                    app.trips().update_day(&trip_id, day, label, date, theme)?,
                    || format!("day {} of trip '{}'", day, trip_id),
                )?;
                println!("day updated");
            }
            TripCommands::Delete { trip_id } => {
                require(app.trips().delete(&trip_id)?, || {
                    format!("trip '{}'", trip_id)
                })?;
                println!("deleted");
            }
        },
        Commands::City(command) => match command {
            CityCommands::Ls => print_json(&app.user_places().list()?),
            CityCommands::Rm { id } => {
                require(app.user_places().delete(&id)?, || format!("city '{}'", id))?;
                println!("deleted");
            }
            CityCommands::Image { id, url } => {
                require(app.user_places().update_image(&id, &url)?, || {
                    format!("city '{}'", id)
                })?;
                println!("image updated");
            }
        },
        Commands::Proximity(command) => match command {
            ProximityCommands::Show => print_json(&app.proximity().settings()?),
            ProximityCommands::Enable => {
                app.proximity().set_enabled(true)?;
                println!("proximity alerts enabled");
            }
            ProximityCommands::Disable => {
                app.proximity().set_enabled(false)?;
                println!("proximity alerts disabled");
            }
            ProximityCommands::Distance { meters } => {
                println!("distance set to {}m", app.proximity().set_distance(meters)?);
            }
            ProximityCommands::City { city_id } => {
                let enabled = app.proximity().toggle_city(&city_id)?;
                println!(
                    "alerts {} for {}",
                    if enabled { "enabled" } else { "disabled" },
                    city_id
                );
            }
            ProximityCommands::ResetNotified => {
                app.proximity().reset_notified()?;
                println!("notified places cleared");
            }
            ProximityCommands::Check { lat, lng } => {
                let buckets = app.recommendations().list()?;
                print_json(&app.proximity().check_position(&buckets, lat, lng)?);
            }
        },
        Commands::Reconcile => {
            if app.reconcile_once()? {
                println!("reconciliation completed");
            } else {
                println!("already reconciled this session");
            }
        }
    }

    Ok(())
}

fn visited_word(visited: bool) -> &'static str {
    if visited {
        "visited"
    } else {
        "unvisited"
    }
}

fn require(
    matched: bool,
    what: impl FnOnce() -> String,
) -> Result<(), app::AppError> {
    if matched {
        Ok(())
    } else {
        Err(app::AppError::NotFound(what()))
    }
}

/// Routes and trips are created against a city that already has
/// recommendations; its bucket supplies the city id and country.
fn resolve_city(app: &app::App, city: &str) -> Result<(String, String, String), app::AppError> {
    let buckets = app.recommendations().list()?;
    let bucket = buckets
        .iter()
        .find(|bucket| bucket.matches_city(city))
        .ok_or_else(|| app::AppError::NotFound(format!("city '{}' (add places first)", city)))?;
    Ok((
        bucket.city_id.clone(),
        bucket.city.clone(),
        bucket.country.clone().unwrap_or_default(),
    ))
}

fn new_route_from_args(
    app: &app::App,
    args: cli::NewItineraryArgs,
) -> Result<routes::NewRoute, app::AppError> {
    let (city_id, city, country) = resolve_city(app, &args.city)?;
    Ok(routes::NewRoute {
        name: args.name,
        city_id,
        city,
        country,
        start_date: args.start,
        end_date: args.end,
    })
}

fn new_trip_from_args(
    app: &app::App,
    args: cli::NewItineraryArgs,
) -> Result<trips::NewTrip, app::AppError> {
    let (city_id, city, country) = resolve_city(app, &args.city)?;
    Ok(trips::NewTrip {
        name: args.name,
        city_id,
        city,
        country,
        start_date: args.start,
        end_date: args.end,
    })
}

/// Rebuild a day's sequence from ids given in the desired order; refs
/// not mentioned keep their relative order at the end.
fn reorder_refs<T: Clone>(
    current: &[T],
    ids: &[String],
    id_of: impl Fn(&T) -> &domain::place::PlaceId,
) -> Result<Vec<T>, app::AppError> {
    let mut ordered = Vec::with_capacity(current.len());
    for id in ids {
        let wanted = domain::place::PlaceId::from(id.as_str());
        let found = current
            .iter()
            .find(|candidate| id_of(candidate) == &wanted)
            .ok_or_else(|| app::AppError::NotFound(format!("place '{}' in day", id)))?;
        ordered.push(found.clone());
    }
    for candidate in current {
        if !ordered
            .iter()
            .any(|chosen| id_of(chosen) == id_of(candidate))
        {
            ordered.push(candidate.clone());
        }
    }
    Ok(ordered)
}
