use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "waylist")]
#[command(bin_name = "waylist")]
#[command(version)]
#[command(about = "A local-first travel recommendation and itinerary store")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "WAYLIST_DB_PATH",
        help = "Path to the local SQLite database (defaults to ~/.waylist/waylist.db)."
    )]
    pub db: Option<String>,

    #[arg(
        short = 'c',
        long,
        env = "WAYLIST_CONFIG",
        help = "Path to the TOML config file (defaults to ~/.waylist/config.toml)."
    )]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Parse text and store it as recommendations for a city.")]
    Add(AddArgs),
    #[command(about = "List places grouped by city, with optional filters.")]
    Ls(LsArgs),
    #[command(about = "Mark a place visited (or unvisited), propagating to routes and trips.")]
    Visit(VisitArgs),
    #[command(about = "Edit a place's description, website or source.")]
    Edit(EditArgs),
    #[command(about = "Delete a place; empty city buckets are pruned.")]
    Rm(RmArgs),
    #[command(subcommand, about = "Manage collections of places.")]
    Collection(CollectionCommands),
    #[command(subcommand, about = "Manage routes (day-partitioned itineraries).")]
    Route(RouteCommands),
    #[command(subcommand, about = "Manage trips (routes with derived visit times).")]
    Trip(TripCommands),
    #[command(subcommand, about = "Manage the home-screen city list.")]
    City(CityCommands),
    #[command(subcommand, about = "Proximity alert settings and position checks.")]
    Proximity(ProximityCommands),
    #[command(about = "Run the once-per-session local/remote reconciliation pass.")]
    Reconcile,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(help = "City the recommendations are for.")]
    pub city: String,

    #[arg(help = "Text to parse: 'Category: name, name' lines or one place per line.")]
    pub text: String,

    #[arg(long, help = "Country for the city bucket.")]
    pub country: Option<String>,
}

#[derive(Debug, Args)]
pub struct LsArgs {
    #[arg(long = "category", help = "Only show these categories (repeatable).")]
    pub categories: Vec<String>,

    #[arg(long, help = "Only show cities in this country.")]
    pub country: Option<String>,
}

#[derive(Debug, Args)]
pub struct VisitArgs {
    #[arg(help = "Place id.")]
    pub place_id: String,

    #[arg(long, help = "Clear the visited flag instead of setting it.")]
    pub unvisit: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(help = "Place id.")]
    pub place_id: String,

    #[arg(long, help = "New description.")]
    pub description: Option<String>,

    #[arg(long, help = "New website URL.")]
    pub website: Option<String>,

    #[arg(long, help = "Attribution text to detect a source from (e.g. 'from @handle').")]
    pub source: Option<String>,

    #[arg(long, help = "A tip to attach to the place.")]
    pub tip: Option<String>,
}

#[derive(Debug, Args)]
pub struct RmArgs {
    #[arg(help = "Place id.")]
    pub place_id: String,
}

#[derive(Debug, Subcommand)]
pub enum CollectionCommands {
    #[command(about = "Create a collection.")]
    New {
        #[arg(help = "Collection name.")]
        name: String,
    },
    #[command(about = "List collections.")]
    Ls,
    #[command(about = "Add a place to a collection.")]
    Add {
        collection_id: String,
        place_id: String,
    },
    #[command(about = "Remove a place from a collection.")]
    Rm {
        collection_id: String,
        place_id: String,
    },
    #[command(about = "Enable or disable route mode (an explicit ordering).")]
    RouteMode {
        collection_id: String,
        #[arg(long, help = "Disable route mode instead of enabling it.")]
        off: bool,
    },
    #[command(about = "Set the explicit place order.")]
    Order {
        collection_id: String,
        #[arg(help = "Place ids in the desired order.")]
        place_ids: Vec<String>,
    },
    #[command(about = "Rename a collection.")]
    Rename { collection_id: String, name: String },
    #[command(about = "Delete a collection.")]
    Delete { collection_id: String },
}

#[derive(Debug, Args)]
pub struct NewItineraryArgs {
    #[arg(help = "Name.")]
    pub name: String,

    #[arg(long, help = "City (must already have recommendations).")]
    pub city: String,

    #[arg(long, help = "Start date (YYYY-MM-DD).")]
    pub start: Option<String>,

    #[arg(long, help = "End date (YYYY-MM-DD).")]
    pub end: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum RouteCommands {
    #[command(about = "Create a route with an empty day 1.")]
    New(NewItineraryArgs),
    #[command(about = "Create a route from a collection's places.")]
    FromCollection {
        collection_id: String,
        #[command(flatten)]
        args: NewItineraryArgs,
    },
    #[command(about = "List routes grouped by status.")]
    Ls,
    #[command(about = "Show one route, pruning references to deleted places.")]
    Show { route_id: String },
    #[command(about = "Append a day.")]
    AddDay { route_id: String },
    #[command(about = "Remove an empty day.")]
    RmDay { route_id: String, day: u32 },
    #[command(about = "Add a place to a day.")]
    Add {
        route_id: String,
        day: u32,
        place_id: String,
    },
    #[command(about = "Remove a place from the route.")]
    Rm { route_id: String, place_id: String },
    #[command(about = "Reorder a day's places.")]
    Reorder {
        route_id: String,
        day: u32,
        #[arg(help = "Place ids in the desired order.")]
        place_ids: Vec<String>,
    },
    #[command(about = "Toggle a place's visited flag from inside the route.")]
    Visit {
        route_id: String,
        place_id: String,
        #[arg(long)]
        unvisit: bool,
    },
    #[command(about = "Set a day's label or date.")]
    Day {
        route_id: String,
        day: u32,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    #[command(about = "Delete a route.")]
    Delete { route_id: String },
}

#[derive(Debug, Subcommand)]
pub enum TripCommands {
    #[command(about = "Create a trip with an empty day 1.")]
    New(NewItineraryArgs),
    #[command(about = "List trips with progress.")]
    Ls,
    #[command(about = "Show one trip.")]
    Show { trip_id: String },
    #[command(about = "Append a day.")]
    AddDay { trip_id: String },
    #[command(about = "Remove an empty day (remaining days renumber).")]
    RmDay { trip_id: String, day: u32 },
    #[command(about = "Add a place to a day (the day is rescheduled).")]
    Add {
        trip_id: String,
        day: u32,
        place_id: String,
    },
    #[command(about = "Remove a place from the trip.")]
    Rm { trip_id: String, place_id: String },
    #[command(about = "Reorder a day's places.")]
    Reorder {
        trip_id: String,
        day: u32,
        #[arg(help = "Place ids in the desired order.")]
        place_ids: Vec<String>,
    },
    #[command(about = "Move a place to another day (both days are rescheduled).")]
    Move {
        trip_id: String,
        from_day: u32,
        to_day: u32,
        place_id: String,
    },
    #[command(about = "Toggle a place's visited flag from inside the trip.")]
    Visit {
        trip_id: String,
        place_id: String,
        #[arg(long)]
        unvisit: bool,
    },
    #[command(about = "Set a day's label, date or theme.")]
    Day {
        trip_id: String,
        day: u32,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        theme: Option<String>,
    },
    #[command(about = "Delete a trip.")]
    Delete { trip_id: String },
}

#[derive(Debug, Subcommand)]
pub enum CityCommands {
    #[command(about = "List home-screen cities.")]
    Ls,
    #[command(about = "Remove a city entry.")]
    Rm { id: String },
    #[command(about = "Set a city entry's image.")]
    Image { id: String, url: String },
}

#[derive(Debug, Subcommand)]
pub enum ProximityCommands {
    #[command(about = "Show current proximity settings.")]
    Show,
    #[command(about = "Enable proximity alerts.")]
    Enable,
    #[command(about = "Disable proximity alerts.")]
    Disable,
    #[command(about = "Set the alert distance in meters (clamped to 100..=2000).")]
    Distance { meters: u32 },
    #[command(about = "Toggle alerts for one city.")]
    City { city_id: String },
    #[command(about = "Clear the notified-place registry.")]
    ResetNotified,
    #[command(about = "Check a position against monitored places.")]
    Check {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
}
