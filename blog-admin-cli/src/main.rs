mod logging;
mod settings;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use blog_admin::{
    ActionOutcome, AdminClientError, AssumeYes, Category, CategoryUpdate, Confirm, ContactMessage,
    FilterKind, HttpClient, Limit, ListScreen, ListView, MemoryHistory, PageNav, Post, PostStatus,
    PostUpdate, QueryPatch, Readable, Resource, Row, ScreenConfig, Session, Sort, User,
    UserUpdate, parse_token,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use crate::logging::init_logging;
use crate::settings::Settings;

const TOKEN_FILE: &str = ".blog_token";

#[derive(Debug, Parser)]
#[command(name = "blog-admin-cli", version, about = "Админка блога в терминале")]
struct Cli {
    /// Адрес API (по умолчанию BLOG_API_URL или http://127.0.0.1:8080/api).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Сохранить токен администратора.
    Login {
        #[arg(long)]
        token: String,
    },
    /// Удалить сохранённый токен.
    Logout,
    /// Страница списка: posts, scheduled, users, categories, contacts.
    List {
        resource: Resource,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        sort: Option<Sort>,
        /// Посты одного автора; список синхронизируется с URL.
        #[arg(long, conflicts_with = "category")]
        author: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Удаление строки (с подтверждением).
    Delete {
        resource: Resource,
        #[arg(long)]
        id: String,
        /// Не спрашивать подтверждение.
        #[arg(long)]
        yes: bool,
    },
    /// Пометить сообщение обратной связи прочитанным.
    MarkRead {
        #[arg(long)]
        id: String,
    },
    /// Опубликовать запланированный пост сейчас.
    Publish {
        #[arg(long)]
        id: String,
    },
    /// Изменить пост.
    UpdatePost {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Изменить категорию.
    UpdateCategory {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Изменить пользователя.
    UpdateUser {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    /// Запланировать публикацию поста (RFC 3339, например 2030-01-01T09:00:00Z).
    Schedule {
        #[arg(long)]
        id: String,
        #[arg(long)]
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Draft,
    Published,
    Scheduled,
}

impl From<StatusArg> for PostStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Draft => PostStatus::Draft,
            StatusArg::Published => PostStatus::Published,
            StatusArg::Scheduled => PostStatus::Scheduled,
        }
    }
}

struct ListArgs {
    page: Option<u32>,
    limit: Option<u32>,
    search: Option<String>,
    sort: Option<Sort>,
    author: Option<String>,
    category: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    init_logging(&settings.log_level)?;

    let cli = Cli::parse();
    let base_url = normalize_server(cli.server.unwrap_or_else(|| settings.api_url.clone()));

    let token = load_token().context("не удалось прочитать .blog_token")?;
    let session = token.map(Session::new).unwrap_or_default();
    let client =
        Arc::new(HttpClient::new(base_url, settings.timeouts()).map_err(map_client_error)?);
    let ctx = App { client, session };

    match cli.command {
        Command::Login { token } => {
            let token = parse_token(&token).ok_or_else(|| anyhow!("токен не может быть пустым"))?;
            fs::write(TOKEN_FILE, token).context("не удалось сохранить токен")?;
            println!("Токен сохранён в {TOKEN_FILE}");
        }
        Command::Logout => {
            if Path::new(TOKEN_FILE).exists() {
                fs::remove_file(TOKEN_FILE).context("не удалось удалить токен")?;
            }
            println!("Выход выполнен");
        }
        Command::List {
            resource,
            page,
            limit,
            search,
            sort,
            author,
            category,
        } => {
            let args = ListArgs {
                page,
                limit,
                search,
                sort,
                author,
                category,
            };
            match resource {
                Resource::Posts | Resource::ScheduledPosts => {
                    list::<Post>(&ctx, resource, args).await?
                }
                Resource::Users => list::<User>(&ctx, resource, args).await?,
                Resource::Categories => list::<Category>(&ctx, resource, args).await?,
                Resource::Contacts => list::<ContactMessage>(&ctx, resource, args).await?,
            }
        }
        Command::Delete { resource, id, yes } => {
            let confirm: Arc<dyn Confirm> = if yes {
                Arc::new(AssumeYes)
            } else {
                Arc::new(ask_stdin)
            };
            let outcome = match resource {
                Resource::Posts | Resource::ScheduledPosts => {
                    delete::<Post>(&ctx, resource, &id, confirm).await?
                }
                Resource::Users => delete::<User>(&ctx, resource, &id, confirm).await?,
                Resource::Categories => delete::<Category>(&ctx, resource, &id, confirm).await?,
                Resource::Contacts => {
                    delete::<ContactMessage>(&ctx, resource, &id, confirm).await?
                }
            };
            match outcome {
                ActionOutcome::Cancelled => println!("Отменено"),
                _ => println!("Удалено: id={id}"),
            }
        }
        Command::MarkRead { id } => {
            let mut screen =
                ctx.screen::<ContactMessage>(Resource::Contacts, ScreenConfig::internal());
            screen.load().await.map_err(map_client_error)?;
            let outcome = screen.mark_read(&id).await.map_err(map_client_error)?;
            match outcome {
                ActionOutcome::Unchanged => println!("Уже прочитано: id={id}"),
                _ => println!("Прочитано: id={id}"),
            }
            if let Some(message) = screen.store().find(&id) {
                print_row(&message);
            }
        }
        Command::Publish { id } => {
            let mut screen = ctx.screen::<Post>(Resource::ScheduledPosts, ScreenConfig::internal());
            screen.load().await.map_err(map_client_error)?;
            screen.publish_now(&id).await.map_err(map_client_error)?;
            println!("Опубликовано: id={id}");
            if let Some(post) = screen.store().find(&id) {
                print_row(&post);
            }
        }
        Command::UpdatePost {
            id,
            title,
            content,
            category,
            status,
        } => {
            let form = PostUpdate {
                title,
                content,
                category,
                status: status.map(PostStatus::from),
                published_at: None,
            };
            update::<Post, _>(&ctx, Resource::Posts, &id, &form).await?;
        }
        Command::UpdateCategory {
            id,
            name,
            description,
        } => {
            let form = CategoryUpdate { name, description };
            update::<Category, _>(&ctx, Resource::Categories, &id, &form).await?;
        }
        Command::UpdateUser {
            id,
            name,
            email,
            role,
        } => {
            let form = UserUpdate { name, email, role };
            update::<User, _>(&ctx, Resource::Users, &id, &form).await?;
        }
        Command::Schedule { id, at } => {
            update::<Post, _>(&ctx, Resource::Posts, &id, &PostUpdate::schedule(at)).await?;
            println!("Публикация запланирована на {}", at.to_rfc3339());
        }
    }

    Ok(())
}

struct App {
    client: Arc<HttpClient>,
    session: Session,
}

impl App {
    fn screen<T: Row>(&self, resource: Resource, config: ScreenConfig) -> ListScreen<T> {
        self.screen_with_confirm(resource, config, Arc::new(AssumeYes))
    }

    fn screen_with_confirm<T: Row>(
        &self,
        resource: Resource,
        config: ScreenConfig,
        confirm: Arc<dyn Confirm>,
    ) -> ListScreen<T> {
        ListScreen::new(
            self.client.clone(),
            self.session.clone(),
            resource,
            config,
            MemoryHistory::default(),
            confirm,
        )
    }
}

fn screen_config(args: &ListArgs) -> ScreenConfig {
    if args.author.is_some() {
        ScreenConfig::author_scoped()
    } else if args.category.is_some() {
        ScreenConfig::filtered(FilterKind::Category)
    } else {
        ScreenConfig::internal()
    }
}

fn list_patch(args: &ListArgs) -> Result<QueryPatch> {
    let mut patch = QueryPatch::default();
    if let Some(limit) = args.limit {
        patch = patch.with_limit(Limit::try_from(limit).map_err(|err| anyhow!(err))?);
    }
    if let Some(search) = &args.search {
        patch = patch.with_search(search.clone());
    }
    if let Some(sort) = args.sort {
        patch = patch.with_sort(sort);
    }
    if let Some(filter_id) = args.author.clone().or_else(|| args.category.clone()) {
        patch = patch.with_filter(Some(filter_id));
    }
    Ok(patch)
}

async fn list<T: Row + PrintRow>(ctx: &App, resource: Resource, args: ListArgs) -> Result<()> {
    let config = screen_config(&args);
    let mut screen = ctx.screen::<T>(resource, config);

    // Фильтры сбрасывают страницу, поэтому страница применяется вторым шагом.
    let loaded = screen
        .update_query(list_patch(&args)?)
        .await
        .map_err(map_client_error)?;
    if loaded.is_none() {
        screen.load().await.map_err(map_client_error)?;
    }
    if let Some(page) = args.page {
        screen
            .navigate(PageNav::Page(page))
            .await
            .map_err(map_client_error)?;
    }

    print_screen(&screen, resource);
    Ok(())
}

async fn delete<T: Row>(
    ctx: &App,
    resource: Resource,
    id: &str,
    confirm: Arc<dyn Confirm>,
) -> Result<ActionOutcome> {
    let mut screen = ctx.screen_with_confirm::<T>(resource, ScreenConfig::internal(), confirm);
    // Загрузка нужна только ради названия в вопросе подтверждения.
    if let Err(err) = screen.load().await {
        tracing::debug!(error = %err, "list not loaded before delete");
    }
    screen.delete(id).await.map_err(map_client_error)
}

async fn update<T, F>(ctx: &App, resource: Resource, id: &str, form: &F) -> Result<()>
where
    T: Row + PrintRow,
    F: serde::Serialize + validator::Validate + Sync,
{
    let mut screen = ctx.screen::<T>(resource, ScreenConfig::internal());
    screen.update(id, form).await.map_err(map_client_error)?;
    println!("Сохранено: id={id}");
    if let Some(row) = screen.store().find(id) {
        print_row(&row);
    }
    Ok(())
}

fn ask_stdin(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "д" | "да")
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn load_token() -> io::Result<Option<String>> {
    if !Path::new(TOKEN_FILE).exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(TOKEN_FILE)?;
    Ok(parse_token(&raw))
}

fn map_client_error(err: AdminClientError) -> anyhow::Error {
    let message = match err {
        AdminClientError::Unauthorized => {
            "требуется авторизация: выполните `blog-admin-cli login --token ...`".to_string()
        }
        AdminClientError::NotFound => "ресурс не найден".to_string(),
        AdminClientError::Timeout => "сервер не ответил вовремя".to_string(),
        AdminClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        AdminClientError::Rejected(message) => format!("сервер отклонил запрос: {message}"),
        AdminClientError::Validation(errors) => format!("форма заполнена неверно: {errors}"),
        AdminClientError::Decode(message) => format!("не удалось разобрать ответ: {message}"),
        AdminClientError::Http(err) => format!("ошибка HTTP: {err}"),
    };
    anyhow!(message)
}

trait PrintRow {
    fn line(&self) -> String;
}

impl PrintRow for Post {
    fn line(&self) -> String {
        let author = self
            .author
            .as_ref()
            .map(|author| author.display())
            .unwrap_or("-");
        let published = self
            .published_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "[{}] {} ({:?}, author={author}, published_at={published})",
            self.id, self.title, self.status
        )
    }
}

impl PrintRow for User {
    fn line(&self) -> String {
        let role = self.role.as_deref().unwrap_or("-");
        format!("[{}] {} <{}> role={role}", self.id, self.name, self.email)
    }
}

impl PrintRow for Category {
    fn line(&self) -> String {
        format!("[{}] {}", self.id, self.name)
    }
}

impl PrintRow for ContactMessage {
    fn line(&self) -> String {
        let marker = if self.is_read() { " " } else { "*" };
        format!("{marker}[{}] {} <{}>: {}", self.id, self.name, self.email, self.label())
    }
}

fn print_row(row: &impl PrintRow) {
    println!("- {}", row.line());
}

fn print_screen<T: Row + PrintRow>(screen: &ListScreen<T>, resource: Resource) {
    let state = screen.state();
    match state.view() {
        ListView::Idle => println!("Список не загружен"),
        ListView::Loading => println!("Загрузка..."),
        ListView::LoginRequired => println!("Требуется вход: blog-admin-cli login --token ..."),
        ListView::Failed(message) => println!("Ошибка загрузки: {message}"),
        ListView::NoResults => println!("Ничего не найдено"),
        ListView::Items(rows) => {
            println!(
                "{resource}: {} из {} (страница {} из {})",
                rows.len(),
                state.total,
                screen.query().page,
                state.total_pages
            );
            for row in rows {
                print_row(row);
            }
        }
    }

    println!("{}", screen.pagination().render_bar());
    if screen.controller().config().url_synced {
        println!("URL: ?{}", screen.controller().url_query());
    }
}
