//! Linux location source backed by the GeoClue2 D-Bus service.

use std::sync::{Arc, Mutex};

use futures::StreamExt;
use log::warn;
use tokio::sync::mpsc;
use zbus::Connection;
use zbus::zvariant::{ObjectPath, OwnedObjectPath};

use crate::{
    Accuracy, Fix, LocationDelegate, LocationError, LocationResult, LocationSource, UpdateConfig,
    timestamp_now,
};

const DESKTOP_ID: &str = "geobeacon";

// GClueAccuracyLevel values from the GeoClue2 D-Bus API.
const ACCURACY_CITY: u32 = 4;
const ACCURACY_NEIGHBORHOOD: u32 = 5;
const ACCURACY_STREET: u32 = 6;
const ACCURACY_EXACT: u32 = 8;

// GeoClue reports this in the Altitude property when no altitude is known.
const UNKNOWN_ALTITUDE: f64 = -1.0e300;

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Manager",
    default_service = "org.freedesktop.GeoClue2",
    default_path = "/org/freedesktop/GeoClue2/Manager"
)]
trait Manager {
    fn get_client(&self) -> zbus::Result<OwnedObjectPath>;
}

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Client",
    default_service = "org.freedesktop.GeoClue2"
)]
trait Client {
    fn start(&self) -> zbus::Result<()>;

    fn stop(&self) -> zbus::Result<()>;

    #[zbus(property)]
    fn location(&self) -> zbus::Result<OwnedObjectPath>;

    #[zbus(property)]
    fn set_desktop_id(&mut self, id: &str) -> zbus::Result<()>;

    #[zbus(property)]
    fn set_requested_accuracy_level(&mut self, level: u32) -> zbus::Result<()>;

    #[zbus(property)]
    fn set_distance_threshold(&mut self, threshold: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn location_updated(
        &self,
        old: ObjectPath<'_>,
        new: ObjectPath<'_>,
    ) -> zbus::Result<()>;
}

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Location",
    default_service = "org.freedesktop.GeoClue2"
)]
trait GeoLocation {
    #[zbus(property)]
    fn latitude(&self) -> zbus::Result<f64>;

    #[zbus(property)]
    fn longitude(&self) -> zbus::Result<f64>;

    #[zbus(property)]
    fn altitude(&self) -> zbus::Result<f64>;

    #[zbus(property)]
    fn accuracy(&self) -> zbus::Result<f64>;
}

enum Command {
    Configure(UpdateConfig),
    Start,
    Stop,
    RequestFix,
}

type SharedDelegate = Arc<Mutex<Option<Arc<dyn LocationDelegate>>>>;

/// A [`LocationSource`] that subscribes to GeoClue2 over the system bus.
///
/// The D-Bus traffic runs on a driver task; the trait methods only enqueue
/// commands, so they stay synchronous and callable from delegate context.
pub struct GeoClueSource {
    commands: mpsc::UnboundedSender<Command>,
    delegate: SharedDelegate,
}

impl std::fmt::Debug for GeoClueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoClueSource").finish()
    }
}

impl GeoClueSource {
    /// Connect to GeoClue2 and register a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the system bus or the GeoClue2 service is not
    /// reachable.
    pub async fn connect() -> LocationResult<Self> {
        let connection = Connection::system().await.map_err(backend_error)?;
        let manager = ManagerProxy::new(&connection).await.map_err(backend_error)?;
        let client_path = manager.get_client().await.map_err(backend_error)?;

        let mut client = ClientProxy::builder(&connection)
            .path(client_path)
            .map_err(backend_error)?
            .build()
            .await
            .map_err(backend_error)?;
        client
            .set_desktop_id(DESKTOP_ID)
            .await
            .map_err(backend_error)?;

        let updates = client
            .receive_location_updated()
            .await
            .map_err(backend_error)?;

        let (commands, receiver) = mpsc::unbounded_channel();
        let delegate: SharedDelegate = Arc::new(Mutex::new(None));
        tokio::spawn(drive(
            connection,
            client,
            updates,
            receiver,
            delegate.clone(),
        ));

        Ok(Self { commands, delegate })
    }

    fn send(&self, command: Command) -> LocationResult<()> {
        self.commands
            .send(command)
            .map_err(|_| LocationError::ServiceDisabled)
    }
}

impl LocationSource for GeoClueSource {
    fn configure(&self, config: UpdateConfig) -> LocationResult<()> {
        self.send(Command::Configure(config))
    }

    fn set_delegate(&self, delegate: Arc<dyn LocationDelegate>) {
        *self.delegate.lock().expect("delegate mutex poisoned") = Some(delegate);
    }

    fn start_updates(&self) -> LocationResult<()> {
        // Starting an already-started GeoClue client is a no-op.
        self.send(Command::Start)
    }

    fn stop_updates(&self) {
        if self.send(Command::Stop).is_err() {
            warn!("geoclue driver gone, stop dropped");
        }
    }

    fn request_fix(&self) -> LocationResult<()> {
        self.send(Command::RequestFix)
    }
}

async fn drive(
    connection: Connection,
    mut client: ClientProxy<'static>,
    mut updates: LocationUpdatedStream,
    mut commands: mpsc::UnboundedReceiver<Command>,
    delegate: SharedDelegate,
) {
    loop {
        tokio::select! {
            signal = updates.next() => {
                let Some(signal) = signal else { break };
                match signal.args() {
                    Ok(args) => deliver(&connection, args.new(), &delegate).await,
                    Err(err) => {
                        notify_failure(&delegate, &LocationError::Backend(err.to_string()));
                    }
                }
            }
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Configure(config) => {
                        if let Err(err) = apply_config(&mut client, &config).await {
                            notify_failure(&delegate, &err);
                        }
                    }
                    Command::Start => {
                        if let Err(err) = client.start().await {
                            notify_failure(
                                &delegate,
                                &LocationError::Backend(err.to_string()),
                            );
                        }
                    }
                    Command::Stop => {
                        if let Err(err) = client.stop().await {
                            warn!("failed to stop geoclue client: {err}");
                        }
                    }
                    Command::RequestFix => {
                        match client.location().await {
                            Ok(path) if path.as_str() != "/" => {
                                deliver(&connection, &path, &delegate).await;
                            }
                            Ok(_) => notify_failure(&delegate, &LocationError::NotAvailable),
                            Err(err) => notify_failure(
                                &delegate,
                                &LocationError::Backend(err.to_string()),
                            ),
                        }
                    }
                }
            }
        }
    }
}

async fn apply_config(
    client: &mut ClientProxy<'static>,
    config: &UpdateConfig,
) -> LocationResult<()> {
    // Background delivery and auto-pause have no GeoClue2 equivalent; the
    // client keeps receiving updates for as long as it is started.
    client
        .set_requested_accuracy_level(accuracy_level(config.accuracy))
        .await
        .map_err(backend_error)?;
    let threshold = config.distance_filter.map_or(0, |meters| meters as u32);
    client
        .set_distance_threshold(threshold)
        .await
        .map_err(backend_error)?;
    Ok(())
}

async fn deliver(connection: &Connection, path: &ObjectPath<'_>, delegate: &SharedDelegate) {
    match read_fix(connection, path).await {
        Ok(fix) => {
            let delegate = delegate
                .lock()
                .expect("delegate mutex poisoned")
                .clone();
            if let Some(delegate) = delegate {
                delegate.on_update(&[fix]);
            }
        }
        Err(err) => notify_failure(delegate, &err),
    }
}

async fn read_fix(connection: &Connection, path: &ObjectPath<'_>) -> LocationResult<Fix> {
    let location = GeoLocationProxy::builder(connection)
        .path(path.to_owned())
        .map_err(backend_error)?
        .build()
        .await
        .map_err(backend_error)?;

    let latitude = location.latitude().await.map_err(backend_error)?;
    let longitude = location.longitude().await.map_err(backend_error)?;
    let altitude = location.altitude().await.map_err(backend_error)?;
    let accuracy = location.accuracy().await.ok();

    Ok(Fix {
        latitude,
        longitude,
        altitude: (altitude > UNKNOWN_ALTITUDE).then_some(altitude),
        floor: None,
        horizontal_accuracy: accuracy,
        timestamp: timestamp_now(),
    })
}

fn notify_failure(delegate: &SharedDelegate, error: &LocationError) {
    let delegate = delegate.lock().expect("delegate mutex poisoned").clone();
    if let Some(delegate) = delegate {
        delegate.on_failure(error);
    }
}

fn accuracy_level(accuracy: Accuracy) -> u32 {
    match accuracy {
        Accuracy::Best | Accuracy::TenMeters => ACCURACY_EXACT,
        Accuracy::HundredMeters => ACCURACY_STREET,
        Accuracy::Kilometer => ACCURACY_NEIGHBORHOOD,
        Accuracy::Reduced => ACCURACY_CITY,
    }
}

fn backend_error(err: zbus::Error) -> LocationError {
    LocationError::Backend(err.to_string())
}
