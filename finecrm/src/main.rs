mod render;

use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use finecrmlib::{
    analytics::Analytics,
    backend::{http::HttpBackend, memory::MemoryStore, VehicleKey},
    config::{Config, DeletePolicy, DEFAULT_DATA_DIR, DEFAULT_EXTENDED_URL, DEFAULT_FINES_URL, DEFAULT_GIBDD_URL},
    error::{FinecrmError, Result},
    filter::{FilterPatch, Selection},
    formats::{csv::Csv, decree::Decree, receipt::Receipt, xml::Xml},
    locale::{format_date, format_rub},
    model::{FineStatus, NewFine, ParkingZone},
    notifications::{Inbox, SettingKey},
    parking::{active_passes, NewPass},
    registry::{NewDriver, NewVehicle},
    storage::{AppState, LocalStore},
    traits::{FineStore, PassStore, VehicleLookup, WriteDocument, WriteFormat},
    view_model::FineViewModel,
    wire,
};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StatusArg {
    Paid,
    Unpaid,
    Processing,
}

impl From<StatusArg> for FineStatus {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::Paid => FineStatus::Paid,
            StatusArg::Unpaid => FineStatus::Unpaid,
            StatusArg::Processing => FineStatus::Processing,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ExportFmt {
    Csv,
    Xml,
}

#[derive(Parser, Debug)]
#[command(name = "finecrm", version, about = "Учёт штрафов ГИБДД")]
struct Cli {
    /// Сервис штрафов
    #[arg(long, env = "FINECRM_FINES_URL", default_value = DEFAULT_FINES_URL, global = true)]
    fines_url: String,

    /// Расширенный сервис: журнал удалений, пропуска, VIN
    #[arg(long, env = "FINECRM_EXTENDED_URL", default_value = DEFAULT_EXTENDED_URL, global = true)]
    extended_url: String,

    /// Сервис проверки ТС по госномеру
    #[arg(long, env = "FINECRM_VEHICLE_CHECK_URL", global = true)]
    vehicle_check_url: Option<String>,

    /// Сервис проверки штрафов ГИБДД по ВУ и СТС
    #[arg(long, env = "FINECRM_GIBDD_URL", default_value = DEFAULT_GIBDD_URL, global = true)]
    gibdd_url: String,

    /// Каталог локального состояния
    #[arg(long, env = "FINECRM_DATA_DIR", default_value = DEFAULT_DATA_DIR, global = true)]
    data_dir: PathBuf,

    /// Таймаут запроса, секунды
    #[arg(long, env = "FINECRM_TIMEOUT_SECS", default_value_t = 15, global = true)]
    timeout_secs: u64,

    /// Удаление: hard (DELETE) или soft (PUT со статусом «Удален»; сервис должен принимать PUT)
    #[arg(long, env = "FINECRM_DELETE_POLICY", default_value = "hard", global = true)]
    delete_policy: DeletePolicy,

    /// Кто выполняет удаление
    #[arg(long, env = "FINECRM_OPERATOR", default_value = "admin", global = true)]
    operator: String,

    /// Работать с локальными данными без сервера
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Поиск по номеру постановления, водителю, госномеру
    #[arg(short = 's', long)]
    search: Option<String>,

    #[arg(long, value_enum)]
    status: Option<StatusArg>,

    /// Тип нарушения ("all" для любого)
    #[arg(long = "type")]
    violation_type: Option<String>,
}

impl FilterArgs {
    fn into_patch(self) -> FilterPatch {
        FilterPatch {
            search_term: self.search,
            status: self.status.map(|s| Selection::Only(s.into())),
            violation_type: self
                .violation_type
                .map(|t| Selection::parse_with(&t, |s| Ok(s.to_string())).unwrap_or_default()),
        }
    }
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    number: String,
    #[arg(long)]
    driver: String,
    #[arg(long)]
    plate: String,
    #[arg(long = "type")]
    violation_type: String,
    /// Дата нарушения, ГГГГ-ММ-ДД
    #[arg(long, value_parser = wire::parse_date)]
    date: NaiveDate,
    #[arg(long)]
    amount: Decimal,
    /// Сумма со скидкой (по умолчанию половина)
    #[arg(long)]
    discount: Option<Decimal>,
    #[arg(long, default_value = "")]
    location: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    authority: Option<String>,
    #[arg(long)]
    article: Option<String>,
}

impl From<AddArgs> for NewFine {
    fn from(a: AddArgs) -> Self {
        NewFine {
            violation_number: a.number,
            driver_name: a.driver,
            license_plate: a.plate,
            violation_type: a.violation_type,
            violation_date: Some(a.date),
            amount: Some(a.amount),
            discount_amount: a.discount,
            location: a.location,
            description: a.description,
            issuing_authority: a.authority,
            article_code: a.article,
            ..NewFine::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Список штрафов
    List(FilterArgs),
    /// Статистика и данные диаграмм
    Stats,
    /// Выгрузка отфильтрованного списка
    Export {
        #[arg(long, value_enum, default_value_t = ExportFmt::Csv)]
        format: ExportFmt,
        /// Выходной файл (по умолчанию имя по дате, "-" для stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Добавить штраф
    Add(AddArgs),
    /// Оплатить штраф
    Pay {
        id: i64,
        /// Только показать сумму к оплате
        #[arg(long)]
        dry_run: bool,
    },
    /// Удалить один или несколько штрафов
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Журнал удалений
    History,
    /// Квитанция на оплату
    Receipt {
        id: i64,
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Постановление
    Decree {
        id: i64,
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Парковочные пропуска
    #[command(subcommand)]
    Passes(PassCommand),
    /// Проверка автомобиля по VIN
    Vin { code: String },
    /// Проверка ТС по госномеру или VIN
    Plate {
        #[arg(required_unless_present = "vin")]
        plate: Option<String>,
        #[arg(long, conflicts_with = "plate")]
        vin: Option<String>,
    },
    /// Проверка штрафов в ГИБДД по ВУ и СТС
    Gibdd {
        /// Номер водительского удостоверения
        #[arg(long)]
        license: String,
        /// Номер СТС
        #[arg(long)]
        sts: String,
    },
    /// Уведомления
    #[command(subcommand)]
    Notifications(NotifyCommand),
    /// Аналитика за 30 дней
    Analytics,
    /// Справочник водителей
    #[command(subcommand)]
    Drivers(DriverCommand),
    /// Справочник ТС
    #[command(subcommand)]
    Vehicles(VehicleCommand),
}

#[derive(Subcommand, Debug)]
enum PassCommand {
    List {
        /// Только действующие
        #[arg(long)]
        active: bool,
    },
    Issue {
        #[arg(long)]
        plate: String,
        #[arg(long)]
        driver: String,
        #[arg(long, default_value = "")]
        phone: String,
        /// Действует до, ГГГГ-ММ-ДДTЧЧ:ММ
        #[arg(long, value_parser = wire::parse_timestamp)]
        until: NaiveDateTime,
        /// all | center | mkad | parks
        #[arg(long, default_value = "all")]
        zone: ParkingZone,
        #[arg(long, default_value = "")]
        notes: String,
    },
    Remove { id: i64 },
}

#[derive(Subcommand, Debug)]
enum NotifyCommand {
    List,
    Read { id: String },
    ReadAll,
    Dismiss { id: String },
    /// Включить или выключить оповещение
    Set {
        /// email | sms | push | discount-reminders | payment-reminders | new-fines-alert
        key: SettingKey,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DriverCommand {
    List {
        #[arg(short = 's', long)]
        search: Option<String>,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        license: String,
        #[arg(long, value_parser = wire::parse_date)]
        birth_date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
    },
    Remove { id: u64 },
    /// Штрафы водителя
    Fines { id: u64 },
}

#[derive(Subcommand, Debug)]
enum VehicleCommand {
    List {
        #[arg(short = 's', long)]
        search: Option<String>,
    },
    Add {
        #[arg(long)]
        plate: String,
        #[arg(long)]
        brand: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        year: Option<u16>,
        #[arg(long, default_value = "")]
        color: String,
        #[arg(long, default_value = "")]
        owner: String,
    },
    Remove { id: u64 },
    /// Штрафы по ТС
    Fines { id: u64 },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            fines_url: self.fines_url.clone(),
            extended_url: self.extended_url.clone(),
            vehicle_check_url: self.vehicle_check_url.clone(),
            gibdd_url: self.gibdd_url.clone(),
            data_dir: self.data_dir.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            delete_policy: self.delete_policy,
            operator: self.operator.clone(),
        }
    }
}

/// Откуда берутся данные: сервер или снимок в локальном состоянии.
enum Backend {
    Remote(HttpBackend),
    Offline(MemoryStore),
}

impl Backend {
    fn open(cfg: &Config, offline: bool, state: &AppState) -> Result<Self> {
        if offline {
            info!("offline mode, using local snapshot");
            Ok(Backend::Offline(MemoryStore::new(state.offline.clone(), cfg.delete_policy)))
        } else {
            Ok(Backend::Remote(HttpBackend::new(cfg)?))
        }
    }

    fn fines(&self) -> &dyn FineStore {
        match self {
            Backend::Remote(b) => b,
            Backend::Offline(m) => m,
        }
    }

    fn passes(&self) -> &dyn PassStore {
        match self {
            Backend::Remote(b) => b,
            Backend::Offline(m) => m,
        }
    }

    fn lookup(&self) -> &dyn VehicleLookup {
        match self {
            Backend::Remote(b) => b,
            Backend::Offline(m) => m,
        }
    }

    fn store_snapshot(&self, state: &mut AppState) {
        if let Backend::Offline(m) = self {
            state.offline = m.snapshot();
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Ошибка: {e}");
            ExitCode::FAILURE
        }
    }
}

fn output_writer(path: Option<PathBuf>, default_name: String) -> Result<(Box<dyn Write>, Option<PathBuf>)> {
    let path = path.unwrap_or_else(|| PathBuf::from(default_name));
    if path.as_os_str() == "-" {
        return Ok((Box::new(io::stdout()), None));
    }
    let file = File::create(&path)?;
    Ok((Box::new(BufWriter::new(file)), Some(path)))
}

fn finish(mut w: Box<dyn Write>, path: Option<PathBuf>) -> Result<()> {
    w.flush().map_err(FinecrmError::from)?;
    if let Some(path) = path {
        println!("Сохранено: {}", path.display());
    }
    Ok(())
}

fn warn_stale() {
    eprintln!("Внимание: список не перечитан после изменения, данные могут быть устаревшими");
}

fn loaded(backend: &Backend) -> Result<FineViewModel> {
    let mut vm = FineViewModel::new();
    vm.load(backend.fines())?;
    Ok(vm)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let cfg = cli.config();
    let local = LocalStore::open(&cfg.data_dir)?;
    let mut state = local.load();
    let backend = Backend::open(&cfg, cli.offline, &state)?;
    let now = Local::now().naive_local();

    let code = execute(cli.command, &cfg, &backend, &mut state, now)?;

    backend.store_snapshot(&mut state);
    local.save(&state)?;
    Ok(code)
}

fn execute(
    command: Command,
    cfg: &Config,
    backend: &Backend,
    state: &mut AppState,
    now: NaiveDateTime,
) -> Result<ExitCode> {
    let today = now.date();
    match command {
        Command::List(filters) => {
            let mut vm = loaded(backend)?;
            vm.set_filter(filters.into_patch());
            render::fines(vm.filtered_view());
        }
        Command::Stats => {
            let vm = loaded(backend)?;
            render::stats(&vm.stats(), &vm.chart_series());
        }
        Command::Export { format, output, filters } => {
            let mut vm = loaded(backend)?;
            vm.set_filter(filters.into_patch());
            let rows: Vec<_> = vm.filtered_view().into_iter().cloned().collect();
            match format {
                ExportFmt::Csv => {
                    let (mut w, path) = output_writer(output, Csv::file_name(today))?;
                    Csv::write(&mut w, &rows)?;
                    finish(w, path)?;
                }
                ExportFmt::Xml => {
                    let name = format!("Штрафы_ГИБДД_{}.xml", format_date(today));
                    let (mut w, path) = output_writer(output, name)?;
                    Xml::write(&mut w, &rows)?;
                    finish(w, path)?;
                }
            }
        }
        Command::Add(args) => {
            let mut vm = FineViewModel::new();
            vm.add_fine(backend.fines(), args.into())?;
            if vm.is_stale() {
                println!("Штраф добавлен");
                warn_stale();
            } else {
                println!("Штраф добавлен. Всего: {}", vm.stats().total);
            }
        }
        Command::Pay { id, dry_run } => {
            let mut vm = loaded(backend)?;
            let outcome = if dry_run {
                vm.payment_preview(id, now)?
            } else {
                vm.settle_payment(backend.fines(), id, now)?
            };
            if outcome.discount_percent > 0 {
                println!("Скидка {}%", outcome.discount_percent);
            }
            let verb = if dry_run { "К оплате" } else { "Оплачено" };
            println!("{verb}: {}", format_rub(outcome.payable));
            if vm.is_stale() {
                warn_stale();
            }
        }
        Command::Delete { ids, reason } => {
            let mut vm = loaded(backend)?;
            let audit = cfg.audit(reason);
            if let [id] = ids.as_slice() {
                vm.delete(backend.fines(), *id, &audit)?;
                println!("Удалено: {id}");
            } else {
                let report = vm.delete_many(backend.fines(), &ids, &audit);
                println!("Удалено: {}", report.deleted.len());
                for (id, e) in &report.failed {
                    eprintln!("Не удалось удалить {id}: {e}");
                }
                if !report.is_complete() {
                    return Ok(ExitCode::FAILURE);
                }
            }
            if vm.is_stale() {
                warn_stale();
            }
        }
        Command::History => {
            let mut vm = FineViewModel::new();
            vm.load_history(backend.fines());
            render::history(vm.history());
        }
        Command::Receipt { id, output } => {
            let vm = loaded(backend)?;
            let fine = vm.get(id).ok_or_else(|| FinecrmError::fine_not_found(id))?;
            let (mut w, path) = output_writer(output, Receipt::file_name(fine))?;
            Receipt::write(&mut w, fine, now)?;
            finish(w, path)?;
        }
        Command::Decree { id, output } => {
            let vm = loaded(backend)?;
            let fine = vm.get(id).ok_or_else(|| FinecrmError::fine_not_found(id))?;
            let (mut w, path) = output_writer(output, Decree::file_name(fine))?;
            Decree::write(&mut w, fine, now)?;
            finish(w, path)?;
        }
        Command::Passes(cmd) => passes(cmd, backend.passes(), now)?,
        Command::Vin { code } => render::vin(&backend.lookup().lookup_vin(&code)?),
        Command::Plate { plate, vin } => {
            let key = match (plate, vin) {
                (_, Some(vin)) => VehicleKey::Vin(vin),
                (Some(plate), None) => VehicleKey::Plate(plate),
                (None, None) => return Err(FinecrmError::Validation("укажите госномер или VIN".into())),
            };
            render::plate(&backend.lookup().lookup_registration(&key)?);
        }
        Command::Gibdd { license, sts } => render::gibdd(&backend.lookup().gibdd_check(&license, &sts)?),
        Command::Notifications(cmd) => {
            notifications(cmd, backend, state, now)?;
        }
        Command::Analytics => {
            let vm = loaded(backend)?;
            render::analytics(&Analytics::compute(vm.all_fines(), today));
        }
        Command::Drivers(cmd) => drivers(cmd, backend, state)?,
        Command::Vehicles(cmd) => vehicles(cmd, backend, state)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn passes(cmd: PassCommand, store: &dyn PassStore, now: NaiveDateTime) -> Result<()> {
    match cmd {
        PassCommand::List { active } => {
            let all = store.list_passes()?;
            if active {
                let active: Vec<_> = active_passes(&all, now).into_iter().cloned().collect();
                render::passes(&active, now);
            } else {
                render::passes(&all, now);
            }
        }
        PassCommand::Issue { plate, driver, phone, until, zone, notes } => {
            let issued = store.issue_pass(&NewPass {
                license_plate: plate,
                driver_name: driver,
                driver_phone: phone,
                valid_until: Some(until),
                zone,
                notes,
            })?;
            println!("Пропуск {} выдан", issued.pass_number);
        }
        PassCommand::Remove { id } => {
            store.remove_pass(id)?;
            println!("Пропуск {id} удалён");
        }
    }
    Ok(())
}

fn notifications(cmd: NotifyCommand, backend: &Backend, state: &mut AppState, now: NaiveDateTime) -> Result<()> {
    if let NotifyCommand::Set { key, enabled } = cmd {
        state.settings.set(key, enabled);
        println!("Настройки сохранены");
        return Ok(());
    }

    let vm = loaded(backend)?;
    let mut inbox = Inbox::derive(vm.all_fines(), &state.settings, &state.inbox, now);
    match cmd {
        NotifyCommand::List | NotifyCommand::Set { .. } => {}
        NotifyCommand::Read { id } => inbox.mark_read(&id, &mut state.inbox)?,
        NotifyCommand::ReadAll => inbox.mark_all_read(&mut state.inbox),
        NotifyCommand::Dismiss { id } => inbox.dismiss(&id, &mut state.inbox)?,
    }
    render::inbox(&inbox);
    Ok(())
}

fn drivers(cmd: DriverCommand, backend: &Backend, state: &mut AppState) -> Result<()> {
    match cmd {
        DriverCommand::List { search } => {
            // счётчики нарушений только если сервер доступен
            let vm = loaded(backend).ok();
            match search {
                Some(term) => render::drivers(state.drivers.search(&term), vm.as_ref()),
                None => render::drivers(state.drivers.list(), vm.as_ref()),
            }
        }
        DriverCommand::Add { name, license, birth_date, phone, address } => {
            let d = state.drivers.add(NewDriver { name, license_number: license, birth_date, phone, address })?;
            println!("Водитель добавлен: {} ({})", d.name, d.id);
        }
        DriverCommand::Remove { id } => {
            let d = state.drivers.remove(id)?;
            println!("Водитель удалён: {}", d.name);
        }
        DriverCommand::Fines { id } => {
            let driver = state
                .drivers
                .get(id)
                .ok_or_else(|| FinecrmError::NotFound { entity: "driver", id: id.to_string() })?;
            let vm = loaded(backend)?;
            render::fines(vm.driver_fines(&driver.name));
        }
    }
    Ok(())
}

fn vehicles(cmd: VehicleCommand, backend: &Backend, state: &mut AppState) -> Result<()> {
    match cmd {
        VehicleCommand::List { search } => {
            let vm = loaded(backend).ok();
            match search {
                Some(term) => render::vehicles(state.vehicles.search(&term), vm.as_ref()),
                None => render::vehicles(state.vehicles.list(), vm.as_ref()),
            }
        }
        VehicleCommand::Add { plate, brand, model, year, color, owner } => {
            let v = state.vehicles.add(NewVehicle { license_plate: plate, brand, model, year, color, owner })?;
            println!("ТС добавлено: {} ({})", v.license_plate, v.id);
        }
        VehicleCommand::Remove { id } => {
            let v = state.vehicles.remove(id)?;
            println!("ТС удалено: {}", v.license_plate);
        }
        VehicleCommand::Fines { id } => {
            let vehicle = state
                .vehicles
                .get(id)
                .ok_or_else(|| FinecrmError::NotFound { entity: "vehicle", id: id.to_string() })?;
            let vm = loaded(backend)?;
            render::fines(vm.plate_fines(&vehicle.license_plate));
        }
    }
    Ok(())
}
